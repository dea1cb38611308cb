//! Client lifecycle tests over a mock runtime.
//!
//! These cover the launch-once/open-page/shutdown plumbing without needing a
//! Chromium binary.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use golcheck::browser::{BrowserRuntime, BrowserRuntimeError, LaunchPlan};
use golcheck::client::HarnessClient;
use golcheck::config::HarnessConfig;

#[derive(Default)]
struct MockRuntime {
    launches: Mutex<usize>,
    shutdowns: Mutex<usize>,
    pages: Mutex<Vec<(String, String)>>,
    next_page: Mutex<u32>,
}

#[async_trait]
impl BrowserRuntime for Arc<MockRuntime> {
    async fn launch(&self, _plan: &LaunchPlan) -> Result<(), BrowserRuntimeError> {
        *self.launches.lock().unwrap() += 1;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), BrowserRuntimeError> {
        *self.shutdowns.lock().unwrap() += 1;
        Ok(())
    }

    async fn new_page(&self, url: &str) -> Result<String, BrowserRuntimeError> {
        let mut next = self.next_page.lock().unwrap();
        let id = format!("page-{}", *next);
        *next += 1;
        self.pages
            .lock()
            .unwrap()
            .push((id.clone(), url.to_string()));
        Ok(id)
    }

    async fn page_content(&self, page_id: &str) -> Result<Option<String>, BrowserRuntimeError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| id == page_id)
            .map(|(_, url)| format!("content:{url}")))
    }

    async fn list_pages(&self) -> Result<Vec<String>, BrowserRuntimeError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect())
    }
}

fn quiet_config() -> HarnessConfig {
    let mut config = HarnessConfig::default();
    // Route records into a drop-everything sink so tests stay silent.
    config.logger = Some(Arc::new(|_line: &str| {}));
    config
}

#[tokio::test]
async fn open_page_launches_the_browser_once() {
    let runtime = Arc::new(MockRuntime::default());
    let client = HarnessClient::new(quiet_config(), runtime.clone()).expect("client");

    client
        .open_page("http://localhost:5173")
        .await
        .expect("first page");
    client
        .open_page("http://localhost:5174")
        .await
        .expect("second page");

    // The runtime treats repeat launches as no-ops, but both calls reach it.
    assert!(*runtime.launches.lock().unwrap() >= 1);
    assert_eq!(
        client.browser().runtime().list_pages().await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn open_page_tracks_the_active_page() {
    let runtime = Arc::new(MockRuntime::default());
    let client = HarnessClient::new(quiet_config(), runtime).expect("client");

    assert_eq!(client.active_page_id().unwrap(), None);

    let first = client
        .open_page("http://localhost:5173")
        .await
        .expect("page opens");
    assert_eq!(client.active_page_id().unwrap(), Some(first.clone()));

    let second = client
        .open_page("http://localhost:5173")
        .await
        .expect("page opens");
    assert_ne!(first, second);
    assert_eq!(client.active_page_id().unwrap(), Some(second));
}

#[tokio::test]
async fn shutdown_delegates_to_the_runtime() {
    let runtime = Arc::new(MockRuntime::default());
    let client = HarnessClient::new(quiet_config(), runtime.clone()).expect("client");

    client.open_page("http://localhost:5173").await.unwrap();
    client.shutdown().await.expect("shutdown");

    assert_eq!(*runtime.shutdowns.lock().unwrap(), 1);
}

#[tokio::test]
async fn page_content_round_trips_through_the_runtime() {
    let runtime = Arc::new(MockRuntime::default());
    let client = HarnessClient::new(quiet_config(), runtime).expect("client");

    let page_id = client.open_page("http://localhost:5173").await.unwrap();
    let content = client
        .browser()
        .runtime()
        .page_content(&page_id)
        .await
        .unwrap();
    assert_eq!(content.as_deref(), Some("content:http://localhost:5173"));
}
