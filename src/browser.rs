//! Chrome session for reaching pages behind the institution's SSO login.
//!
//! PrairieLearn sits behind CWL with Duo 2FA, so a real (headed) browser
//! window is driven over CDP: credentials are typed into the login form and
//! the user approves the Duo push before the session lands back on
//! PrairieLearn.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

const LOGIN_URL: &str = "https://us.prairielearn.com/pl/login";
const IDP_LINK_XPATH: &str = r#"//a[contains(text(), "University of British Columbia")]"#;

const ELEMENT_TIMEOUT: Duration = Duration::from_secs(10);
const DUO_TIMEOUT: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct PrairieLearnSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl PrairieLearnSession {
    /// Launch a headed Chrome instance and spawn its CDP event loop.
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .with_head()
            .build()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Invalid browser configuration")?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch Chrome")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Log in through the CWL identity provider and wait for the Duo-approved
    /// redirect back to PrairieLearn. Returns the logged-in page.
    pub async fn login(&self, username: &str, password: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(LOGIN_URL)
            .await
            .context("Failed to open the PrairieLearn login page")?;
        page.wait_for_navigation().await?;
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Institution picker
        page.find_xpath(IDP_LINK_XPATH)
            .await
            .context("UBC login link not found")?
            .click()
            .await?;
        page.wait_for_navigation().await?;

        // CWL credential form
        wait_for_element(&page, "#username", ELEMENT_TIMEOUT)
            .await?
            .click()
            .await?
            .type_str(username)
            .await?;
        page.find_element("#password")
            .await
            .context("Password field not found")?
            .click()
            .await?
            .type_str(password)
            .await?;
        page.find_element(r#"[name="_eventId_proceed"]"#)
            .await
            .context("Login button not found")?
            .click()
            .await?;

        println!("\nWaiting for Duo 2FA approval...");
        wait_for_url_contains(&page, "prairielearn.com", DUO_TIMEOUT).await?;
        println!("Login successful!");

        Ok(page)
    }

    /// Navigate the logged-in page to `url` and return its rendered markup.
    pub async fn fetch_page(&self, page: &Page, url: &str) -> Result<String> {
        page.goto(url)
            .await
            .context(format!("Failed to navigate to {}", url))?;
        page.wait_for_navigation().await?;
        // The assessments table is rendered after the initial load
        tokio::time::sleep(Duration::from_secs(2)).await;

        page.content().await.context("Failed to read page content")
    }

    /// Shut the browser down. Best effort; the scrape already has its markup.
    pub async fn close(mut self) {
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

async fn wait_for_element(page: &Page, selector: &str, timeout: Duration) -> Result<Element> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("Timed out waiting for element: {}", selector);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn wait_for_url_contains(page: &Page, needle: &str, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(url) = page.url().await? {
            if url.contains(needle) {
                return Ok(());
            }
        }
        if tokio::time::Instant::now() >= deadline {
            anyhow::bail!("Timed out waiting for redirect to {}", needle);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
