use crate::error::{ReleaseError, Result};
use crate::tools::{Invocation, Tool, ToolRunner, ToolStatus};
use std::process::Command;

/// Build the `Command` that starts `program` in the role of `tool`.
///
/// On Windows, tools installed as `.cmd` scripts (see [Tool::is_script_shim])
/// are started through `cmd /C`. Everything else is spawned directly, so
/// arguments such as multi-line release notes reach the program untouched.
pub fn command(tool: Tool, program: &str) -> Command {
    if cfg!(windows) && tool.is_script_shim() {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(program);
        cmd
    } else {
        Command::new(program)
    }
}

/// Runs invocations as real child processes.
///
/// Standard streams are inherited so tool output reaches the terminal or CI
/// log directly. There is no timeout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolStatus> {
        let mut cmd = command(invocation.tool, &invocation.program);
        cmd.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            cmd.current_dir(dir);
        }

        let status = cmd.status().map_err(|source| ReleaseError::ToolLaunch {
            tool: invocation.tool,
            source,
        })?;

        Ok(ToolStatus {
            code: status.code(),
        })
    }
}
