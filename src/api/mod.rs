mod notion;

pub use notion::NotionClient;
