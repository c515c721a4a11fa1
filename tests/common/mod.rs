#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Once, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();
static SERVER_PID: AtomicU32 = AtomicU32::new(0);
static REAPER: Once = Once::new();

pub const PASSWORD: &str = "password123";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn(database_url: &str) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_baby-organiser-api"));
        cmd.env("PORT", port.to_string())
            .env("DATABASE_URL", database_url)
            .env("APP_ENV", "development")
            .env("DATABASE_ENSURE_SCHEMA", "true")
            .env("SECURITY_BCRYPT_COST", "4")
            // Empty disables the feed database even if .env names one
            .env("FEEDSYNC_DATABASE_URL", "")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;
        reap_at_exit(&child);

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Statics are never dropped, so the server is stopped from an exit hook
/// instead of leaking past the test binary.
fn reap_at_exit(child: &Child) {
    SERVER_PID.store(child.id(), Ordering::SeqCst);
    REAPER.call_once(|| {
        // SAFETY: registers a plain extern "C" fn with no captured state.
        unsafe {
            libc::atexit(stop_server);
        }
    });
}

/// Pid the exit hook will signal, or 0 when nothing is registered.
pub fn reaped_pid() -> u32 {
    SERVER_PID.load(Ordering::SeqCst)
}

extern "C" fn stop_server() {
    let pid = SERVER_PID.swap(0, Ordering::SeqCst);
    if pid != 0 {
        // SAFETY: signals the server process this binary spawned.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
}

/// Starts the server once per test binary. Returns `None` when `DATABASE_URL` is unset.
pub async fn ensure_server() -> Result<Option<&'static TestServer>> {
    let _ = dotenvy::dotenv();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return Ok(None);
    };
    let server = SERVER.get_or_init(|| TestServer::spawn(&database_url).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@test.example.com", prefix, uuid::Uuid::new_v4().simple())
}

/// A registered user with a cookie-aware client.
pub struct Session {
    pub client: reqwest::Client,
    pub base_url: String,
    pub token: String,
    pub user_id: i64,
    pub email: String,
    pub group_id: i64,
}

impl Session {
    pub async fn register(server: &TestServer, prefix: &str) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        let email = unique_email(prefix);
        let res = client
            .post(server.url("/api/auth/register"))
            .json(&json!({ "email": email, "password": PASSWORD, "firstName": prefix }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());
        let body: Value = res.json().await?;

        Ok(Self {
            client,
            base_url: server.base_url.clone(),
            token: body["accessToken"].as_str().context("missing accessToken")?.to_string(),
            user_id: body["user"]["id"].as_i64().context("missing user id")?,
            email,
            group_id: body["group"]["id"].as_i64().context("missing group id")?,
        })
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, path, None).await
    }

    /// Switches the session's access token to another group.
    pub async fn switch_group(&mut self, group_id: i64) -> Result<()> {
        let (status, body) = self.post("/api/auth/switch-group", json!({ "groupId": group_id })).await?;
        anyhow::ensure!(status == StatusCode::OK, "switch-group failed: {} {}", status, body);
        self.token = body["accessToken"].as_str().context("missing accessToken")?.to_string();
        self.group_id = group_id;
        Ok(())
    }
}
