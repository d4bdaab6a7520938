// ==========================================
// 终端客户端集成测试
// ==========================================
// 测试目标: 外壳命令流程（假服务）+ 真实服务端往返 + 服务离线
// ==========================================


use chem_equipment::app::serve;
use chem_equipment::client::{
    ClientError, ClientResult, EquipmentApi, Flow, HistoryEntry, HttpEquipmentApi, Session, Shell,
};
use chem_equipment::config::{AppConfig, ClientConfig};
use chem_equipment::domain::{AuthSession, TypeDistribution};
use std::cell::{Cell, RefCell};
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;

// ==========================================
// 假服务
// ==========================================

#[derive(Default)]
struct FakeApi {
    history: RefCell<Vec<HistoryEntry>>,
    upload_error: RefCell<Option<(u16, String)>>,
    offline: Cell<bool>,
    logouts: Cell<usize>,
}

impl FakeApi {
    fn check_online(&self) -> ClientResult<()> {
        if self.offline.get() {
            Err(ClientError::ConnectionRefused {
                url: "http://fake/api".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn session(username: &str) -> Session {
        Session::new(
            "http://fake/api",
            AuthSession {
                token: "tok".to_string(),
                username: username.to_string(),
            },
        )
    }
}

impl EquipmentApi for FakeApi {
    fn register(&self, username: &str, _password: &str, _email: Option<&str>) -> ClientResult<Session> {
        self.check_online()?;
        Ok(Self::session(username))
    }

    fn login(&self, username: &str, password: &str) -> ClientResult<Session> {
        self.check_online()?;
        if password == "s3cret" {
            Ok(Self::session(username))
        } else {
            Err(ClientError::Unauthorized(
                "Invalid username or password".to_string(),
            ))
        }
    }

    fn logout(&self, _session: &Session) -> ClientResult<()> {
        self.logouts.set(self.logouts.get() + 1);
        self.check_online()
    }

    fn upload(&self, _session: &Session, path: &Path) -> ClientResult<HistoryEntry> {
        self.check_online()?;
        if let Some((status, message)) = self.upload_error.borrow().clone() {
            return Err(ClientError::Server { status, message });
        }

        let mut history = self.history.borrow_mut();
        let entry = HistoryEntry {
            id: Some(history.len() as i64 + 100),
            total_equipment: Some(3),
            avg_flowrate: Some(20.0),
            avg_pressure: Some(3.0),
            avg_temperature: Some(60.0),
            type_distribution: Some(TypeDistribution::from_pairs(vec![("Pump", 2), ("Valve", 1)])),
            source_filename: path.file_name().map(|n| n.to_string_lossy().to_string()),
            created_at: Some("2026-10-19T08:00:00".to_string()),
        };
        history.insert(0, entry.clone());
        Ok(entry)
    }

    fn history(&self, _session: &Session) -> ClientResult<Vec<HistoryEntry>> {
        self.check_online()?;
        Ok(self.history.borrow().clone())
    }

    fn download_report(&self, _session: &Session, _dataset_id: i64) -> ClientResult<Vec<u8>> {
        self.check_online()?;
        Ok(b"%PDF-1.5 fake".to_vec())
    }
}

type FakeShell = Shell<FakeApi, std::io::Empty, Vec<u8>>;

fn fake_shell(report_dir: &Path) -> FakeShell {
    let mut config = ClientConfig::with_api_url("http://fake/api");
    config.report_dir = report_dir.to_path_buf();
    Shell::new(FakeApi::default(), std::io::empty(), Vec::new(), config)
}

fn run_commands(shell: &mut FakeShell, commands: &[&str]) {
    for command in commands {
        assert_eq!(shell.execute(command).expect("terminal io"), Flow::Continue);
    }
}

fn output_of(shell: FakeShell) -> String {
    String::from_utf8(shell.into_output()).expect("utf8 output")
}

// ==========================================
// 外壳行为（假服务）
// ==========================================

#[test]
fn test_commands_require_login() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());

    run_commands(&mut shell, &["upload plant.csv", "history", "report 1"]);
    assert!(shell.session().is_none());

    let output = output_of(shell);
    assert_eq!(output.matches("Please log in first.").count(), 3);
}

#[test]
fn test_login_failure_message() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());

    run_commands(&mut shell, &["login operator wrong"]);
    assert!(shell.session().is_none());
    assert!(output_of(shell).contains("Not authorized: Invalid username or password"));
}

#[test]
fn test_upload_then_dashboard_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());

    run_commands(
        &mut shell,
        &["login operator s3cret", "upload data/plant.csv", "dashboard", "report 100"],
    );

    let rows = shell.history_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 100);
    assert_eq!(shell.dashboard().unwrap().dataset_id, Some(100));

    let saved = dir.path().join("equipment_report_100.pdf");
    assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.5 fake");

    let output = output_of(shell);
    let uploading = output.find("Uploading plant.csv...").expect("progress line");
    let complete = output.find("Upload complete: dataset #100.").expect("completion line");
    assert!(uploading < complete);
    assert!(output.contains("Avg Flowrate"));
    assert!(output.contains("Report saved to"));
}

#[test]
fn test_rejected_upload_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());

    run_commands(&mut shell, &["login operator s3cret", "upload plant.csv"]);
    *shell.api().upload_error.borrow_mut() =
        Some((400, "Only CSV or Excel files allowed".to_string()));
    run_commands(&mut shell, &["upload notes.txt"]);

    assert_eq!(shell.history_rows().len(), 1);
    assert_eq!(shell.dashboard().unwrap().dataset_id, Some(100));

    let output = output_of(shell);
    assert!(output.contains("Uploading notes.txt..."));
    assert!(output.contains("Rejected by server (HTTP 400): Only CSV or Excel files allowed"));
}

#[test]
fn test_offline_refresh_keeps_cached_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());

    run_commands(&mut shell, &["login operator s3cret", "upload plant.csv"]);
    shell.api().offline.set(true);
    run_commands(&mut shell, &["refresh"]);

    assert_eq!(shell.history_rows().len(), 1);
    assert!(output_of(shell).contains("Server is offline or unreachable"));
}

#[test]
fn test_report_only_for_known_ids() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());

    run_commands(
        &mut shell,
        &["login operator s3cret", "upload plant.csv", "report 7", "render 7", "report x"],
    );

    assert!(!dir.path().join("equipment_report_7.pdf").exists());
    let output = output_of(shell);
    assert_eq!(output.matches("Unknown dataset id 7.").count(), 2);
    assert!(output.contains("Usage: report <dataset-id> [output-path]"));
}

#[test]
fn test_local_render_writes_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());
    let target = dir.path().join("local.pdf");

    run_commands(
        &mut shell,
        &[
            "login operator s3cret",
            "upload plant.csv",
            &format!("render 100 {}", target.display()),
        ],
    );

    let texts = test_helpers::pdf_text(&std::fs::read(&target).unwrap());
    assert!(texts.iter().any(|t| t == "Dataset ID: 100"));
    assert!(texts.iter().any(|t| t == "20.0"));
}

#[test]
fn test_logout_drops_session_even_when_offline() {
    let dir = tempfile::tempdir().unwrap();
    let mut shell = fake_shell(dir.path());

    run_commands(&mut shell, &["login operator s3cret", "upload plant.csv"]);
    shell.api().offline.set(true);
    run_commands(&mut shell, &["logout"]);

    assert!(shell.session().is_none());
    assert!(shell.history_rows().is_empty());
    assert_eq!(shell.api().logouts.get(), 1);
}

#[test]
fn test_run_loop_reads_until_quit() {
    let config = ClientConfig::with_api_url("http://fake/api");
    let input = Cursor::new("help\nbogus\nquit\nhelp\n");
    let mut shell = Shell::new(FakeApi::default(), input, Vec::new(), config);
    shell.run().unwrap();

    let output = String::from_utf8(shell.into_output()).unwrap();
    assert_eq!(output.matches("Commands:").count(), 1);
    assert!(output.contains("Unknown command `bogus`"));
}

// ==========================================
// 真实服务端往返
// ==========================================

struct LiveServer {
    addr: SocketAddr,
    stop: Option<tokio::sync::oneshot::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl LiveServer {
    fn start() -> Self {
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let thread = std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind");
                addr_tx.send(listener.local_addr().expect("addr")).expect("send addr");

                let state = test_helpers::create_memory_state(AppConfig::with_db_path(":memory:"));
                serve(state, listener, async move {
                    let _ = stop_rx.await;
                })
                .await
                .expect("serve");
            });
        });

        let addr = addr_rx.recv().expect("server address");
        Self {
            addr,
            stop: Some(stop_tx),
            thread: Some(thread),
        }
    }

    fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[test]
fn test_http_client_round_trip() {
    let server = LiveServer::start();
    let api = HttpEquipmentApi::new(&ClientConfig::with_api_url(server.api_url())).unwrap();

    let session = api.register("operator", "s3cret", None).unwrap();
    assert_eq!(session.username(), "operator");

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("plant.csv");
    std::fs::write(&csv_path, test_helpers::SAMPLE_CSV).unwrap();

    let entry = api.upload(&session, &csv_path).unwrap();
    let id = entry.id.expect("server id");
    assert_eq!(entry.avg_flowrate, Some(20.0));
    assert_eq!(entry.source_filename.as_deref(), Some("plant.csv"));

    let history = api.history(&session).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, Some(id));

    let pdf = api.download_report(&session, id).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    match api.download_report(&session, id + 1000) {
        Err(ClientError::Server { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Dataset not found");
        }
        other => panic!("Expected 404, got {:?}", other.map(|b| b.len())),
    }

    let bad_path = dir.path().join("notes.txt");
    std::fs::write(&bad_path, "hello").unwrap();
    match api.upload(&session, &bad_path) {
        Err(ClientError::Server { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Only CSV or Excel files allowed");
        }
        other => panic!("Expected 400, got {:?}", other),
    }

    api.logout(&session).unwrap();
    assert!(matches!(
        api.history(&session),
        Err(ClientError::Unauthorized(_))
    ));
}

#[test]
fn test_shell_against_live_server() {
    let server = LiveServer::start();
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("plant.csv");
    std::fs::write(&csv_path, test_helpers::SAMPLE_CSV).unwrap();

    let mut config = ClientConfig::with_api_url(server.api_url());
    config.report_dir = dir.path().to_path_buf();
    let api = HttpEquipmentApi::new(&config).unwrap();

    let script = format!(
        "register operator s3cret\nupload {}\nhistory\ndashboard\nquit\n",
        csv_path.display()
    );
    let mut shell = Shell::new(api, Cursor::new(script), Vec::new(), config);
    shell.run().unwrap();

    let rows = shell.history_rows();
    assert_eq!(rows.len(), 1);
    let id = rows[0].id;
    assert_eq!(shell.execute(&format!("report {}", id)).unwrap(), Flow::Continue);

    let saved = dir.path().join(format!("equipment_report_{}.pdf", id));
    let texts = test_helpers::pdf_text(&std::fs::read(saved).unwrap());
    assert!(texts.iter().any(|t| t == "Chemical Equipment Report"));

    let output = String::from_utf8(shell.into_output()).unwrap();
    assert!(output.contains("Logged in as operator."));
    assert!(output.contains(&format!("Upload complete: dataset #{}.", id)));
}

#[test]
fn test_connection_refused_is_reported() {
    // 取一个空闲端口后立即释放
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api =
        HttpEquipmentApi::new(&ClientConfig::with_api_url(format!("http://127.0.0.1:{}/api", port)))
            .unwrap();

    let err = api.login("operator", "s3cret").unwrap_err();
    assert!(matches!(err, ClientError::ConnectionRefused { .. }), "{:?}", err);
    assert!(err.user_message().contains("offline"));
}

#[test]
fn test_unresponsive_server_times_out() {
    // 只监听不应答：TCP 握手由内核完成，请求永远等不到响应
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = ClientConfig {
        timeout: std::time::Duration::from_secs(1),
        ..ClientConfig::with_api_url(format!("http://127.0.0.1:{}/api", port))
    };
    let api = HttpEquipmentApi::new(&config).unwrap();

    let started = std::time::Instant::now();
    let err = api.login("operator", "s3cret").unwrap_err();
    assert!(matches!(err, ClientError::Timeout { .. }), "{:?}", err);
    assert!(err.user_message().contains("did not respond in time"));
    assert!(started.elapsed() < std::time::Duration::from_secs(10));

    drop(listener);
}
