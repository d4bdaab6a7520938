// ==========================================
// 化工设备参数可视化 - 终端外壳
// ==========================================
// 命令: login / register / logout / upload / history(refresh) /
//       dashboard / report / render / help / quit
// 约束: 请求失败时保留之前的缓存状态
// ==========================================

use crate::client::api_client::EquipmentApi;
use crate::client::error::{ClientError, ClientResult};
use crate::client::session::Session;
use crate::client::view_model::{history_rows, DashboardView, HistoryEntry, HistoryRow};
use crate::config::ClientConfig;
use crate::report;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const PROMPT: &str = "chem> ";

const HELP: &str = "\
Commands:
  login <user> <password>               sign in
  register <user> <password> [email]    create an account and sign in
  logout                                sign out
  upload <path>                         upload a CSV/Excel file
  history | refresh                     list recent datasets
  dashboard                             show the latest dataset
  report <dataset-id> [output-path]     download the server-rendered PDF
  render <dataset-id> [output-path]     render a PDF locally from history
  help                                  show this help
  quit                                  exit";

/// 单条命令执行后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<A, R, W>
where
    A: EquipmentApi,
    R: BufRead,
    W: Write,
{
    api: A,
    input: R,
    output: W,
    config: ClientConfig,
    session: Option<Session>,
    history: Vec<HistoryEntry>,
    dashboard: Option<DashboardView>,
}

impl<A, R, W> Shell<A, R, W>
where
    A: EquipmentApi,
    R: BufRead,
    W: Write,
{
    pub fn new(api: A, input: R, output: W, config: ClientConfig) -> Self {
        Self {
            api,
            input,
            output,
            config,
            session: None,
            history: Vec::new(),
            dashboard: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn history_rows(&self) -> Vec<HistoryRow> {
        history_rows(&self.history)
    }

    pub fn dashboard(&self) -> Option<&DashboardView> {
        self.dashboard.as_ref()
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// 读取命令直到 quit 或输入结束
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "{} {}", crate::APP_NAME, crate::VERSION)?;
        writeln!(self.output, "Type `help` for commands.")?;

        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }
            if self.execute(&line)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// 执行一行命令；业务错误输出到终端，只有终端 I/O 错误向上返回
    pub fn execute(&mut self, line: &str) -> io::Result<Flow> {
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = args.split_first() else {
            return Ok(Flow::Continue);
        };

        let result = match command {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => self.print(HELP),
            "login" => match rest {
                [user, password] => self.login(user, password),
                _ => self.usage("login <user> <password>"),
            },
            "register" => match rest {
                [user, password] => self.register(user, password, None),
                [user, password, email] => self.register(user, password, Some(*email)),
                _ => self.usage("register <user> <password> [email]"),
            },
            "logout" => self.logout(),
            "upload" => match rest {
                [path] => self.upload(Path::new(path)),
                _ => self.usage("upload <path>"),
            },
            "history" | "refresh" => self.refresh_history(),
            "dashboard" => self.show_dashboard(),
            "report" | "render" => match parse_report_args(rest) {
                Some((id, output)) if command == "report" => self.download_report(id, output),
                Some((id, output)) => self.render_report(id, output),
                None => self.usage(&format!("{} <dataset-id> [output-path]", command)),
            },
            other => self.print(&format!("Unknown command `{}`. Type `help`.", other)),
        };

        if let Err(err) = result {
            tracing::warn!("命令失败: command={}, error={}", command, err);
            match err {
                ClientError::Io(io_err) if io_err.kind() == io::ErrorKind::BrokenPipe => {
                    return Err(io_err)
                }
                err => writeln!(self.output, "Error: {}", err.user_message())?,
            }
        }
        Ok(Flow::Continue)
    }

    // ==========================================
    // 命令实现
    // ==========================================

    fn print(&mut self, text: &str) -> ClientResult<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    fn usage(&mut self, usage: &str) -> ClientResult<()> {
        self.print(&format!("Usage: {}", usage))
    }

    fn require_session(&self) -> ClientResult<Session> {
        self.session.clone().ok_or(ClientError::NotLoggedIn)
    }

    fn login(&mut self, username: &str, password: &str) -> ClientResult<()> {
        let session = self.api.login(username, password)?;
        self.start_session(session)
    }

    fn register(&mut self, username: &str, password: &str, email: Option<&str>) -> ClientResult<()> {
        let session = self.api.register(username, password, email)?;
        self.start_session(session)
    }

    fn start_session(&mut self, session: Session) -> ClientResult<()> {
        self.print(&format!("Logged in as {}.", session.username()))?;
        self.session = Some(session);
        self.history.clear();
        self.dashboard = None;

        // 登录后尝试加载历史，失败不影响登录状态
        if let Err(err) = self.refresh_history() {
            self.print(&format!("Could not load history: {}", err.user_message()))?;
        }
        Ok(())
    }

    fn logout(&mut self) -> ClientResult<()> {
        let Some(session) = self.session.take() else {
            return self.print("Not logged in.");
        };
        if let Err(err) = self.api.logout(&session) {
            tracing::warn!("服务端注销失败（本地会话已丢弃）: {}", err);
        }
        self.history.clear();
        self.dashboard = None;
        self.print("Logged out.")
    }

    fn upload(&mut self, path: &Path) -> ClientResult<()> {
        let session = self.require_session()?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        self.print(&format!("Uploading {}...", name))?;
        let entry = self.api.upload(&session, path)?;

        match entry.id {
            Some(id) => self.print(&format!("Upload complete: dataset #{}.", id))?,
            None => self.print("Upload complete.")?,
        }

        let view = DashboardView::from_entry(&entry);
        self.print(&view.render())?;
        self.dashboard = Some(view);

        if let Err(err) = self.refresh_history() {
            self.print(&format!("Could not refresh history: {}", err.user_message()))?;
        }
        Ok(())
    }

    fn refresh_history(&mut self) -> ClientResult<()> {
        let session = self.require_session()?;
        let entries = self.api.history(&session)?;

        self.history = entries;
        self.dashboard = self.history.first().map(DashboardView::from_entry);

        let rows = self.history_rows();
        if rows.is_empty() {
            return self.print("No datasets yet.");
        }
        let lines: Vec<String> = rows.iter().map(HistoryRow::display).collect();
        self.print(&format!("Recent datasets:\n{}", lines.join("\n")))
    }

    fn show_dashboard(&mut self) -> ClientResult<()> {
        match self.dashboard.as_ref().map(DashboardView::render) {
            Some(text) => self.print(&text),
            None => self.print("No datasets yet. Upload a file or run `history`."),
        }
    }

    fn known_entry(&self, id: i64) -> ClientResult<&HistoryEntry> {
        self.history
            .iter()
            .find(|entry| entry.id == Some(id))
            .ok_or(ClientError::UnknownDataset(id))
    }

    fn output_path(&self, id: i64, output: Option<&str>) -> PathBuf {
        match output {
            Some(path) => PathBuf::from(path),
            None => self.config.report_dir.join(report::report_filename(id)),
        }
    }

    fn download_report(&mut self, id: i64, output: Option<&str>) -> ClientResult<()> {
        let session = self.require_session()?;
        self.known_entry(id)?;

        let bytes = self.api.download_report(&session, id)?;
        let path = self.output_path(id, output);
        std::fs::write(&path, &bytes)?;
        self.print(&format!("Report saved to {}", path.display()))
    }

    fn render_report(&mut self, id: i64, output: Option<&str>) -> ClientResult<()> {
        let input = self.known_entry(id)?.report_input();
        let rendered = report::render_report(&input, Some(id), chrono::Local::now().naive_local())?;

        let path = self.output_path(id, output);
        std::fs::write(&path, &rendered.bytes)?;
        self.print(&format!(
            "Report rendered to {} ({} page(s))",
            path.display(),
            rendered.page_count
        ))
    }
}

fn parse_report_args<'a>(rest: &[&'a str]) -> Option<(i64, Option<&'a str>)> {
    match rest {
        [id] => Some((id.parse().ok()?, None)),
        [id, output] => Some((id.parse().ok()?, Some(*output))),
        _ => None,
    }
}
