//! Control channel serve loop
//!
//! Reads command lines from a byte stream, executes them against a
//! [`ReplaySession`], and writes exactly one response line per command.
//! Generic over the stream types so tests can drive it with in-memory
//! buffers while the daemon binds it to stdin/stdout.

use std::io::{self, BufRead, Write};

use super::{Command, Response};
use crate::replay::ReplaySession;

/// Strictly request/response command loop over a duplex byte stream
pub struct ControlChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ControlChannel<R, W> {
    /// Wrap a reader/writer pair
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Serve commands until `QUIT` or end of input.
    ///
    /// Malformed lines earn an `ERR` response and the loop keeps reading;
    /// empty lines are skipped without a response. Every response is
    /// flushed before the next read so the peer's blocking readline
    /// always completes.
    pub fn serve(mut self, session: &mut ReplaySession) -> io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                tracing::debug!("control stream closed");
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    tracing::debug!(error = %e, "rejected control line");
                    self.respond(Response::Err)?;
                    continue;
                }
            };

            if matches!(command, Command::Quit) {
                self.respond(Response::Bye)?;
                return Ok(());
            }
            let response = execute(session, command);
            self.respond(response)?;
        }
    }

    fn respond(&mut self, response: Response) -> io::Result<()> {
        writeln!(self.writer, "{response}")?;
        self.writer.flush()
    }
}

/// Execute one non-QUIT command, mapping failures to `ERR`
fn execute(session: &mut ReplaySession, command: Command) -> Response {
    match command {
        Command::SetServer { host, port } => match session.set_server(&host, port) {
            Ok(()) => Response::Ok,
            Err(e) => {
                tracing::warn!(host = host.as_str(), port, error = %e, "sink connect failed");
                Response::Err
            }
        },
        Command::LoadCsv { path } => match session.load_csv(&path) {
            Ok(summary) => {
                tracing::debug!(path = %path.display(), samples = summary.samples, "interchange loaded");
                Response::Ok
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "interchange load failed");
                Response::Err
            }
        },
        Command::Seek { seconds } => {
            session.seek(seconds);
            Response::Ok
        }
        Command::Play => {
            session.play();
            Response::Ok
        }
        Command::Pause => {
            session.pause();
            Response::Ok
        }
        Command::Stop => {
            session.stop();
            Response::Ok
        }
        Command::PublishOn => {
            session.set_publishing(true);
            Response::Ok
        }
        Command::PublishOff => {
            session.set_publishing(false);
            Response::Ok
        }
        Command::Quit => unreachable!("QUIT handled by the serve loop"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{interchange, project, ReplayConfig};
    use crate::wpilog::{LogBuilder, LogReader};
    use std::io::Cursor;

    fn serve_script(script: &str) -> Vec<String> {
        let mut session = ReplaySession::new(ReplayConfig::default());
        serve_script_with(&mut session, script)
    }

    fn serve_script_with(session: &mut ReplaySession, script: &str) -> Vec<String> {
        let mut out = Vec::new();
        ControlChannel::new(Cursor::new(script.to_string()), &mut out)
            .serve(session)
            .unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_basic_session_script() {
        let responses = serve_script(
            "LOAD_CSV /bad/path\n\
             SEEK 5.0\n\
             PLAY\n\
             PAUSE\n\
             STOP\n\
             PUBLISH_ON\n\
             PUBLISH_OFF\n\
             QUIT\n",
        );
        assert_eq!(
            responses,
            vec!["ERR", "OK", "OK", "OK", "OK", "OK", "OK", "BYE"]
        );
    }

    #[test]
    fn test_malformed_lines_keep_channel_alive() {
        let responses = serve_script("NONSENSE\nSEEK abc\n\n   \nPLAY\nQUIT\n");
        assert_eq!(responses, vec!["ERR", "ERR", "OK", "BYE"]);
    }

    #[test]
    fn test_eof_without_quit_ends_cleanly() {
        let responses = serve_script("PLAY\nPAUSE\n");
        assert_eq!(responses, vec!["OK", "OK"]);
    }

    #[test]
    fn test_quit_stops_processing() {
        let responses = serve_script("QUIT\nPLAY\n");
        assert_eq!(responses, vec!["BYE"]);
    }

    #[test]
    fn test_load_csv_ok_with_real_file() {
        let mut builder = LogBuilder::new();
        builder.start_entry(1, "k", "int64", "", 0);
        builder.append_int64(1, 100_000, 7);
        let reader = LogReader::new(builder.into_bytes()).unwrap();
        let config = ReplayConfig::default();
        let samples = project(&reader, &config);

        let file = tempfile::NamedTempFile::new().unwrap();
        interchange::write_samples(file.path(), &samples).unwrap();

        let mut session = ReplaySession::new(config);
        let script = format!("LOAD_CSV {}\nQUIT\n", file.path().display());
        let responses = serve_script_with(&mut session, &script);
        assert_eq!(responses, vec!["OK", "BYE"]);
        assert_eq!(session.status().frame_count, 6);
    }
}
