use std::fs::{self, File};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Result, ScrapeError};

const PROBE_XPATH: &str = r#"
    var result = document.evaluate(arguments[0], document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null);
    return result.singleNodeValue !== null;
"#;

const CLICK_XPATH: &str = r#"
    var result = document.evaluate(arguments[0], document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null);
    var el = result.singleNodeValue;
    if (el === null) { return false; }
    el.scrollIntoView({block: 'center'});
    el.click();
    return true;
"#;

const PROBE_CSS: &str = "return document.querySelector(arguments[0]) !== null;";

const SNAPSHOT: &str =
    r#"return document.documentElement ? document.documentElement.outerHTML : "";"#;

/// One isolated headless Chrome instance driven over the WebDriver
/// protocol, backed by a chromedriver child process spawned for this
/// session alone.
///
/// Acquisition contract: [`BrowserSession::acquire`] pairs with exactly one
/// [`BrowserSession::release`] on every exit path. `Drop` kills the driver
/// process as a backstop so an early error return cannot leak it.
pub struct BrowserSession {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
    driver: Option<Child>,
    element_wait: Duration,
}

impl BrowserSession {
    /// Spawn a chromedriver on a free local port and open a headless
    /// session with a fixed viewport. Fails with
    /// [`ScrapeError::BrowserUnavailable`] when the driver cannot start or
    /// never becomes ready; there is no retry at this layer.
    pub async fn acquire(config: &Config) -> Result<Self> {
        let port = free_local_port().map_err(ScrapeError::BrowserUnavailable)?;
        let endpoint = format!("http://127.0.0.1:{port}");

        let mut driver = spawn_driver(config, port, &endpoint)
            .await
            .map_err(ScrapeError::BrowserUnavailable)?;

        let client = reqwest::Client::new();
        let caps = chrome_capabilities(config);
        let session_id = match create_session(&client, &endpoint, &caps).await {
            Ok(id) => id,
            Err(e) => {
                let _ = driver.kill();
                let _ = driver.wait();
                return Err(ScrapeError::BrowserUnavailable(e));
            }
        };
        debug!(endpoint, session_id, "browser session ready");

        Ok(Self {
            client,
            endpoint,
            session_id,
            driver: Some(driver),
            element_wait: config.element_wait,
        })
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        let nav_endpoint = format!(
            "{}/session/{}/url",
            self.endpoint.trim_end_matches('/'),
            self.session_id
        );
        let res = self
            .client
            .post(nav_endpoint)
            .json(&json!({ "url": url }))
            .send()
            .await
            .map_err(|e| ScrapeError::Protocol(format!("navigate request failed: {e}")))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ScrapeError::Protocol(format!("navigate response read failed: {e}")))?;
        webdriver_value(status, &body, "navigate").map_err(ScrapeError::Protocol)?;
        Ok(())
    }

    /// Run a script through `execute/sync` and return its value.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        let exec_endpoint = format!(
            "{}/session/{}/execute/sync",
            self.endpoint.trim_end_matches('/'),
            self.session_id
        );
        let res = self
            .client
            .post(exec_endpoint)
            .json(&json!({ "script": script, "args": args }))
            .send()
            .await
            .map_err(|e| ScrapeError::Protocol(format!("execute script request failed: {e}")))?;
        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ScrapeError::Protocol(format!("execute script response read failed: {e}"))
        })?;
        let value = webdriver_value(status, &body, "execute script").map_err(ScrapeError::Protocol)?;
        Ok(value.pointer("/value").cloned().unwrap_or(Value::Null))
    }

    /// Poll for an element located by XPath until it is present or the
    /// bounded wait expires. `Ok(false)` means absent within the window;
    /// `Err` is reserved for wire failures.
    pub async fn wait_for_xpath(&self, expr: &str) -> Result<bool> {
        self.wait_probe(PROBE_XPATH, expr).await
    }

    /// Same bounded wait, locating by CSS selector.
    pub async fn wait_for_css(&self, selector: &str) -> Result<bool> {
        self.wait_probe(PROBE_CSS, selector).await
    }

    /// Click the element located by XPath inside the page. `Ok(false)` when
    /// the element is gone by click time.
    pub async fn click_xpath(&self, expr: &str) -> Result<bool> {
        let clicked = self.execute(CLICK_XPATH, vec![json!(expr)]).await?;
        Ok(clicked.as_bool().unwrap_or(false))
    }

    /// Rendered DOM snapshot of the current page.
    pub async fn html(&self) -> Result<String> {
        let value = self.execute(SNAPSHOT, Vec::new()).await?;
        let html = value.as_str().unwrap_or_default().to_string();
        if html.is_empty() {
            return Err(ScrapeError::Protocol("empty rendered snapshot".to_string()));
        }
        Ok(html)
    }

    async fn wait_probe(&self, probe: &str, target: &str) -> Result<bool> {
        let deadline = Instant::now() + self.element_wait;
        loop {
            let present = self.execute(probe, vec![json!(target)]).await?;
            if present.as_bool().unwrap_or(false) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// Tear the session down: delete it driver-side, then stop the driver
    /// process. Must be called once per acquire, success or failure.
    pub async fn release(mut self) {
        let delete_endpoint = format!(
            "{}/session/{}",
            self.endpoint.trim_end_matches('/'),
            self.session_id
        );
        if let Err(e) = self.client.delete(delete_endpoint).send().await {
            warn!("failed to delete webdriver session: {e}");
        }
        if let Some(mut driver) = self.driver.take() {
            let _ = driver.kill();
            let _ = driver.wait();
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            warn!("browser session dropped without release; killing driver");
            let _ = driver.kill();
            let _ = driver.wait();
        }
    }
}

fn free_local_port() -> std::result::Result<u16, String> {
    let listener = TcpListener::bind(("127.0.0.1", 0))
        .map_err(|e| format!("failed to probe for a free port: {e}"))?;
    let port = listener
        .local_addr()
        .map_err(|e| format!("failed to read probe address: {e}"))?
        .port();
    Ok(port)
}

fn driver_reachable(endpoint: &str) -> bool {
    let parsed = match Url::parse(endpoint) {
        Ok(u) => u,
        Err(_) => return false,
    };
    let host = match parsed.host_str() {
        Some(h) => h,
        None => return false,
    };
    let port = parsed.port_or_known_default().unwrap_or(4444);
    let Ok(addrs) = (host, port).to_socket_addrs() else {
        return false;
    };
    addrs
        .into_iter()
        .any(|addr| TcpStream::connect_timeout(&addr, Duration::from_secs(2)).is_ok())
}

async fn spawn_driver(
    config: &Config,
    port: u16,
    endpoint: &str,
) -> std::result::Result<Child, String> {
    let log_path = std::env::temp_dir().join(format!("ringdex-chromedriver-{port}.log"));
    let log_file = File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&log_path)
        .map_err(|e| format!("failed to open driver log {}: {e}", log_path.display()))?;
    let log_file_err = log_file
        .try_clone()
        .map_err(|e| format!("failed to clone driver log handle: {e}"))?;

    let mut cmd = Command::new(&config.chromedriver);
    cmd.arg(format!("--port={port}"))
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_file_err))
        .stdin(Stdio::null());

    let mut child = cmd
        .spawn()
        .map_err(|e| format!("failed to spawn {}: {e}", config.chromedriver))?;

    let steps = (config.driver_start_timeout.as_millis() as u64 / 200).max(1);
    for _ in 0..steps {
        if driver_reachable(endpoint) {
            return Ok(child);
        }
        if let Ok(Some(status)) = child.try_wait() {
            return Err(format!(
                "{} exited early with status {status} (log: {})",
                config.chromedriver,
                log_path.display()
            ));
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let _ = child.kill();
    let _ = child.wait();
    Err(format!(
        "{} did not become ready in time (log: {})",
        config.chromedriver,
        log_path.display()
    ))
}

fn chrome_capabilities(config: &Config) -> Value {
    let profile_dir = std::env::temp_dir().join(format!(
        "ringdex-chrome-profile-{}-{}",
        std::process::id(),
        Utc::now().timestamp_millis()
    ));
    let _ = fs::create_dir_all(&profile_dir);

    let (width, height) = config.window_size;
    let args = vec![
        format!("--user-data-dir={}", profile_dir.display()),
        "--headless".to_string(),
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        format!("--window-size={width},{height}"),
        "--remote-debugging-port=0".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "acceptInsecureCerts": true,
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

async fn create_session(
    client: &reqwest::Client,
    endpoint: &str,
    caps: &Value,
) -> std::result::Result<String, String> {
    let session_endpoint = format!("{}/session", endpoint.trim_end_matches('/'));
    let res = client
        .post(&session_endpoint)
        .json(caps)
        .send()
        .await
        .map_err(|e| format!("session create request failed: {e}"))?;
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| format!("session create response read failed: {e}"))?;
    let value = webdriver_value(status, &body, "session create")?;
    value
        .pointer("/value/sessionId")
        .and_then(|v| v.as_str())
        .or_else(|| value.pointer("/sessionId").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
        .ok_or_else(|| {
            format!(
                "session id missing in response: {}",
                truncate_for_log(&body, 220)
            )
        })
}

/// Parse a WebDriver response body, surfacing HTTP and in-band errors.
fn webdriver_value(
    status: reqwest::StatusCode,
    body: &str,
    what: &str,
) -> std::result::Result<Value, String> {
    if !status.is_success() {
        return Err(format!(
            "{what} HTTP {}: {}",
            status.as_u16(),
            truncate_for_log(body, 240)
        ));
    }
    let value: Value = serde_json::from_str(body).unwrap_or_default();
    if let Some(err) = value.pointer("/value/error").and_then(|v| v.as_str()) {
        let message = value
            .pointer("/value/message")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown webdriver error");
        return Err(format!("{err}: {message}"));
    }
    Ok(value)
}

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let truncated = input.chars().take(max_chars).collect::<String>();
    format!("{truncated}…")
}
