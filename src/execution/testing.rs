//! Scripted executor for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::executor::CommandExecutor;
use super::options::RunCommandOptions;
use crate::error::ExecError;
use crate::output::CommandOutput;
use crate::Result;

#[derive(Debug, Clone)]
enum Reply {
    Output(CommandOutput),
    Error(String),
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Reply>,
    recorded: Vec<RunCommandOptions>,
}

/// Replays canned results and records every request it receives.
///
/// Replies are consumed in order; the last one repeats forever. Copies share
/// the same script so tests can inspect what a wrapped copy received.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedExecutor {
    script: Arc<Mutex<Script>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, reply: Reply) -> Self {
        self.script.lock().unwrap().replies.push_back(reply);
        self
    }

    pub fn with_stdout(self, code: i32, stdout: &str) -> Self {
        let mut output = CommandOutput::new();
        output.set_stdout(stdout.as_bytes().to_vec());
        output.set_stderr(Vec::new());
        output.set_return_code(code);
        self.push(Reply::Output(output))
    }

    pub fn with_error(self, message: &str) -> Self {
        self.push(Reply::Error(message.to_string()))
    }

    /// Every request received so far, in order.
    pub fn recorded(&self) -> Vec<RunCommandOptions> {
        self.script.lock().unwrap().recorded.clone()
    }

    /// Argument vectors of every request received so far.
    pub fn recorded_commands(&self) -> Vec<Vec<String>> {
        self.recorded().into_iter().map(|o| o.command).collect()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run_command(&self, options: &RunCommandOptions) -> Result<CommandOutput> {
        let mut script = self.script.lock().unwrap();
        script.recorded.push(options.clone());

        let reply = if script.replies.len() > 1 {
            script.replies.pop_front()
        } else {
            script.replies.front().cloned()
        };

        match reply {
            Some(Reply::Output(output)) => Ok(output),
            Some(Reply::Error(message)) => Err(ExecError::Launch {
                command: options.joined_command(),
                source: std::io::Error::other(message),
            }),
            None => Err(ExecError::InvalidRequest("no scripted reply".into())),
        }
    }

    fn host_description(&self) -> Result<String> {
        Ok("scripted".to_string())
    }

    fn deep_copy(&self) -> Box<dyn CommandExecutor> {
        Box::new(self.clone())
    }
}
