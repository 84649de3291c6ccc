#![allow(dead_code)]

use media_intake::Config;
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::OnceCell;
use tokio::time::sleep;

pub static SHARED_SERVER: OnceCell<TestServer> = OnceCell::const_new();

static WORKSPACE_SEQ: AtomicUsize = AtomicUsize::new(0);

pub const MISSING_FILES: &str =
    "Missing files. Expect multipart fields: sourceImage (image) and targetVideo (video).";

/// Test harness that runs the server on its own runtime thread
pub struct TestServer {
    _handle: JoinHandle<()>,
    port: u16,
    upload_dir: PathBuf,
}

impl TestServer {
    /// Get or create shared test server instance
    pub async fn shared() -> &'static TestServer {
        SHARED_SERVER
            .get_or_init(|| async { Self::start(Config::default()).await })
            .await
    }

    /// Start a dedicated server; port and upload dir are filled in here
    pub async fn start(config: Config) -> Self {
        let _ = tracing_subscriber::fmt::try_init();

        let port = portpicker::pick_unused_port().expect("No available port");
        let upload_dir = fresh_workspace();
        let _ = tokio::fs::remove_dir_all(&upload_dir).await;

        let config = Config {
            port,
            upload_dir: upload_dir.clone(),
            ..config
        };

        // Spawn the server in a separate thread with its own runtime
        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                if let Err(error) = media_intake::run(config).await {
                    eprintln!("test server stopped: {error:#}");
                }
            });
        });

        let server = TestServer {
            _handle: handle,
            port,
            upload_dir,
        };

        // Poll until server is ready
        let client = server.client();
        for _ in 0..200 {
            if let Ok(response) = client.get(server.url("/health")).send().await
                && response.status().is_success()
            {
                break;
            }

            sleep(Duration::from_millis(10)).await;
        }

        server
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap()
    }

    pub async fn upload(&self, client: &reqwest::Client, form: Form) -> reqwest::Response {
        client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .expect("upload request failed")
    }

    /// Names of everything currently in the upload directory
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.upload_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }
}

pub fn fresh_workspace() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let seq = WORKSPACE_SEQ.fetch_add(1, Ordering::Relaxed);
    PathBuf::from(format!("/tmp/media-intake-test-{now}-{seq}"))
}

pub fn file_part(bytes: &[u8], filename: &str, mime: &str) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(filename.to_string())
        .mime_str(mime)
        .unwrap()
}

pub fn image_part() -> Part {
    file_part(b"\x89PNG\r\n\x1a\nface", "face.png", "image/png")
}

pub fn video_part() -> Part {
    file_part(b"\x00\x00\x00\x18ftypmp42clip", "clip.mp4", "video/mp4")
}

pub fn valid_form() -> Form {
    Form::new()
        .part("sourceImage", image_part())
        .part("targetVideo", video_part())
}

/// `<field>-<digits>-<hex><ext>`
pub fn assert_generated_name(name: &str, field: &str, ext: &str) {
    let rest = name
        .strip_prefix(&format!("{field}-"))
        .unwrap_or_else(|| panic!("{name} does not start with {field}-"));
    let rest = rest
        .strip_suffix(ext)
        .unwrap_or_else(|| panic!("{name} does not end with {ext}"));
    let (millis, hex) = rest
        .split_once('-')
        .unwrap_or_else(|| panic!("{name} has no random suffix"));
    assert!(!millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()), "{name}");
    assert!(!hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()), "{name}");
}

/// `job_<digits>_<hex>`
pub fn assert_job_id(job_id: &str) {
    let rest = job_id
        .strip_prefix("job_")
        .unwrap_or_else(|| panic!("{job_id} does not start with job_"));
    let (millis, hex) = rest
        .split_once('_')
        .unwrap_or_else(|| panic!("{job_id} has no random suffix"));
    assert!(!millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()), "{job_id}");
    assert!(!hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()), "{job_id}");
}
