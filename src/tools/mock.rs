use crate::error::Result;
use crate::tools::{Invocation, Tool, ToolRunner, ToolStatus};
use std::sync::Mutex;

type Hook = Box<dyn Fn(&Invocation) + Send + Sync>;
type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

struct Failure {
    matches: Matcher,
    code: i32,
}

/// Test runner that records invocations instead of spawning processes.
///
/// Every invocation succeeds unless a failure rule matches it. Hooks run on
/// each successful invocation of their tool, which lets a test stand in for a
/// tool's side effects (for example writing the regenerated changelog).
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    failures: Vec<Failure>,
    hooks: Vec<(Tool, Hook)>,
}

impl RecordingRunner {
    /// Create a runner where every tool succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `tool` exit with `code`
    pub fn fail_tool(self, tool: Tool, code: i32) -> Self {
        self.fail_when(move |i| i.tool == tool, code)
    }

    /// Make invocations of `tool` whose first argument is `subcommand` exit with `code`
    pub fn fail_subcommand(self, tool: Tool, subcommand: &str, code: i32) -> Self {
        let subcommand = subcommand.to_string();
        self.fail_when(
            move |i| i.tool == tool && i.subcommand() == Some(subcommand.as_str()),
            code,
        )
    }

    /// Make every invocation accepted by `matches` exit with `code`
    pub fn fail_when(
        mut self,
        matches: impl Fn(&Invocation) -> bool + Send + Sync + 'static,
        code: i32,
    ) -> Self {
        self.failures.push(Failure {
            matches: Box::new(matches),
            code,
        });
        self
    }

    /// Run `hook` whenever `tool` is invoked successfully
    pub fn on_run(mut self, tool: Tool, hook: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        self.hooks.push((tool, Box::new(hook)));
        self
    }

    /// All recorded invocations, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded invocations of `tool`
    pub fn calls_to(&self, tool: Tool) -> usize {
        self.invocations().iter().filter(|i| i.tool == tool).count()
    }

    /// Number of recorded invocations of `tool` with the given first argument
    pub fn calls_to_subcommand(&self, tool: Tool, subcommand: &str) -> usize {
        self.invocations()
            .iter()
            .filter(|i| i.tool == tool && i.subcommand() == Some(subcommand))
            .count()
    }

    /// Recorded invocations rendered as `program arg ...`
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|i| {
                std::iter::once(i.program.as_str())
                    .chain(i.args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

impl ToolRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolStatus> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        if let Some(failure) = self.failures.iter().find(|f| (f.matches)(invocation)) {
            return Ok(ToolStatus::from_code(failure.code));
        }

        for (tool, hook) in &self.hooks {
            if *tool == invocation.tool {
                hook(invocation);
            }
        }
        Ok(ToolStatus::from_code(0))
    }
}
