//! Release orchestration
//!
//! The release is a fixed, ordered list of stages run by a single driver loop.
//! Each stage receives the shared [PipelineContext]; the first failure stops
//! the run and is reported as a [PipelineError] naming the stage. Nothing is
//! retried or rolled back, so stages that already changed the repository stay
//! changed.

use crate::changelog::{self, ReleaseNote};
use crate::ci::CiEnvironment;
use crate::config::Config;
use crate::error::{PipelineError, ReleaseError, Result};
use crate::manifest;
use crate::tools::{Invocation, Tool, ToolRunner};
use crate::ui;
use crate::version::{self, Component, ParsedVersion, Version};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One step of the release, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ParseVersion,
    ComputeVersion,
    RewriteManifest,
    RefreshLockfile,
    SyncSecondaryManifests,
    GenerateChangelog,
    ConfigureCiIdentity,
    CommitAndPush,
    ExtractReleaseNotes,
    CreateRelease,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::ParseVersion => "parse-version",
            Stage::ComputeVersion => "compute-version",
            Stage::RewriteManifest => "rewrite-manifest",
            Stage::RefreshLockfile => "refresh-lockfile",
            Stage::SyncSecondaryManifests => "sync-secondary-manifests",
            Stage::GenerateChangelog => "generate-changelog",
            Stage::ConfigureCiIdentity => "configure-ci-identity",
            Stage::CommitAndPush => "commit-and-push",
            Stage::ExtractReleaseNotes => "extract-release-notes",
            Stage::CreateRelease => "create-release",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Stage::ParseVersion => "Reading current version",
            Stage::ComputeVersion => "Computing next version",
            Stage::RewriteManifest => "Updating primary manifest",
            Stage::RefreshLockfile => "Refreshing dependency lock file",
            Stage::SyncSecondaryManifests => "Syncing secondary manifests",
            Stage::GenerateChangelog => "Regenerating changelog",
            Stage::ConfigureCiIdentity => "Configuring CI commit identity",
            Stage::CommitAndPush => "Committing and pushing",
            Stage::ExtractReleaseNotes => "Extracting release notes",
            Stage::CreateRelease => "Creating release",
        }
    }

    /// 1-based position in [STAGES]
    pub fn number(&self) -> usize {
        STAGES
            .iter()
            .position(|d| d.stage == *self)
            .map_or(0, |i| i + 1)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub stage: Stage,
    /// Whether completing the stage changes files, history, or git settings
    pub mutates: bool,
}

const fn descriptor(stage: Stage, mutates: bool) -> StageDescriptor {
    StageDescriptor { stage, mutates }
}

/// Every stage in execution order
pub const STAGES: [StageDescriptor; 10] = [
    descriptor(Stage::ParseVersion, false),
    descriptor(Stage::ComputeVersion, false),
    descriptor(Stage::RewriteManifest, true),
    descriptor(Stage::RefreshLockfile, true),
    descriptor(Stage::SyncSecondaryManifests, true),
    descriptor(Stage::GenerateChangelog, true),
    descriptor(Stage::ConfigureCiIdentity, true),
    descriptor(Stage::CommitAndPush, true),
    descriptor(Stage::ExtractReleaseNotes, false),
    descriptor(Stage::CreateRelease, true),
];

/// How a stage ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(String),
    /// Dry run: the stage would have done this
    Simulated(String),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    pub outcome: Outcome,
}

/// Run-scoped state threaded through every stage.
///
/// Only used for the run itself and the final report.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub component: Component,
    pub current: Option<Version>,
    pub next: Option<Version>,
    pub release_note: Option<ReleaseNote>,
    pub outcomes: Vec<StageOutcome>,
    manifest: Option<(String, ParsedVersion)>,
}

impl PipelineContext {
    pub fn new(component: Component) -> Self {
        PipelineContext {
            component,
            current: None,
            next: None,
            release_note: None,
            outcomes: Vec::new(),
            manifest: None,
        }
    }

    pub fn current_version(&self) -> Result<Version> {
        self.current
            .ok_or_else(|| ReleaseError::parse("current version has not been read yet"))
    }

    pub fn next_version(&self) -> Result<Version> {
        self.next
            .ok_or_else(|| ReleaseError::parse("next version has not been computed yet"))
    }

    /// Completed stages that changed repository or git state
    pub fn mutated_stages(&self) -> Vec<Stage> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Completed(_)))
            .filter(|o| STAGES.iter().any(|d| d.stage == o.stage && d.mutates))
            .map(|o| o.stage)
            .collect()
    }

    /// Outcome recorded for `stage`, if it ran
    pub fn outcome(&self, stage: Stage) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.stage == stage)
            .map(|o| &o.outcome)
    }

    fn record(&mut self, stage: Stage, outcome: Outcome) {
        self.outcomes.push(StageOutcome { stage, outcome });
    }
}

/// Drives the release stages against a repository root.
pub struct ReleasePipeline<'a, R: ToolRunner> {
    root: PathBuf,
    config: &'a Config,
    runner: &'a R,
    env: CiEnvironment,
    dry_run: bool,
}

impl<'a, R: ToolRunner> ReleasePipeline<'a, R> {
    pub fn new(root: impl Into<PathBuf>, config: &'a Config, runner: &'a R, env: CiEnvironment) -> Self {
        ReleasePipeline {
            root: root.into(),
            config,
            runner,
            env,
            dry_run: false,
        }
    }

    /// In dry-run mode nothing is written and no external tool is started
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current and next version without running any stage.
    ///
    /// Failures are attributed to the stage that would have hit them.
    pub fn preview(&self, component: Component) -> std::result::Result<(Version, Version), PipelineError> {
        let (_, parsed) = self
            .read_version()
            .map_err(|e| PipelineError::new(Stage::ParseVersion, e))?;
        let current = parsed.version;
        let next = version::increment(&current, component)
            .map_err(|e| PipelineError::new(Stage::ComputeVersion, e))?;
        Ok((current, next))
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self, ctx: &mut PipelineContext) -> std::result::Result<(), PipelineError> {
        for descriptor in STAGES {
            self.execute(descriptor.stage, ctx)?;
        }
        Ok(())
    }

    fn execute(&self, stage: Stage, ctx: &mut PipelineContext) -> std::result::Result<(), PipelineError> {
        ui::display_stage(stage);
        match self.run_stage(stage, ctx) {
            Ok(outcome) => {
                match &outcome {
                    Outcome::Completed(detail) => ui::display_success(detail),
                    Outcome::Simulated(detail) => ui::display_status(&format!("(dry run) {}", detail)),
                    Outcome::Skipped(reason) => ui::display_status(&format!("skipped: {}", reason)),
                    Outcome::Failed(_) => {}
                }
                ctx.record(stage, outcome);
                Ok(())
            }
            Err(cause) => {
                ctx.record(stage, Outcome::Failed(cause.to_string()));
                Err(PipelineError::new(stage, cause))
            }
        }
    }

    /// Stages report failure through `Err`; [Outcome::Failed] is only recorded
    /// by [Self::execute].
    fn run_stage(&self, stage: Stage, ctx: &mut PipelineContext) -> Result<Outcome> {
        match stage {
            Stage::ParseVersion => self.parse_version(ctx),
            Stage::ComputeVersion => self.compute_version(ctx),
            Stage::RewriteManifest => self.rewrite_manifest(ctx),
            Stage::RefreshLockfile => self.refresh_lockfile(),
            Stage::SyncSecondaryManifests => self.sync_secondary_manifests(ctx),
            Stage::GenerateChangelog => self.generate_changelog(ctx),
            Stage::ConfigureCiIdentity => self.configure_ci_identity(),
            Stage::CommitAndPush => self.commit_and_push(ctx),
            Stage::ExtractReleaseNotes => self.extract_release_notes(ctx),
            Stage::CreateRelease => self.create_release(ctx),
        }
    }

    fn read_version(&self) -> Result<(String, ParsedVersion)> {
        let path = self.manifest_path();
        let text = manifest::read_manifest(&path)?;
        let parsed = version::parse(&text).map_err(|e| match e {
            ReleaseError::Parse(msg) => ReleaseError::parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        Ok((text, parsed))
    }

    fn parse_version(&self, ctx: &mut PipelineContext) -> Result<Outcome> {
        let (text, parsed) = self.read_version()?;

        for diagnostic in &parsed.diagnostics {
            ui::display_diagnostic(diagnostic);
        }

        let current = parsed.version;
        ctx.current = Some(current);
        ctx.manifest = Some((text, parsed));
        Ok(Outcome::Completed(format!("current version is {}", current)))
    }

    fn compute_version(&self, ctx: &mut PipelineContext) -> Result<Outcome> {
        let current = ctx.current_version()?;
        let next = version::increment(&current, ctx.component)?;
        ui::display_version_change(&current, &next);
        ctx.next = Some(next);
        Ok(Outcome::Completed(format!(
            "{} bump: {} -> {}",
            ctx.component, current, next
        )))
    }

    fn rewrite_manifest(&self, ctx: &mut PipelineContext) -> Result<Outcome> {
        let next = ctx.next_version()?;
        let (text, parsed) = ctx
            .manifest
            .as_ref()
            .ok_or_else(|| ReleaseError::parse("manifest has not been read yet"))?;
        let updated = manifest::rewrite(text, parsed, &next)?;

        let shown = self.config.paths.manifest.display();
        if self.dry_run {
            return Ok(Outcome::Simulated(format!("would set {} to {}", shown, next)));
        }
        manifest::write_manifest(&self.manifest_path(), &updated)?;
        Ok(Outcome::Completed(format!("set {} to {}", shown, next)))
    }

    fn refresh_lockfile(&self) -> Result<Outcome> {
        self.invoke(
            Invocation::new(Tool::LockRefresh, &self.config.tools.cargo)
                .args(["update", "--workspace"])
                .current_dir(&self.root),
        )?;
        Ok(self.done("refreshed workspace lock file"))
    }

    fn sync_secondary_manifests(&self, ctx: &PipelineContext) -> Result<Outcome> {
        if !self.config.secondary.enabled {
            return Ok(Outcome::Skipped(
                "secondary manifests are disabled in configuration".to_string(),
            ));
        }

        let version_text = ctx.next_version()?.to_string();
        semver::Version::parse(&version_text).map_err(|e| ReleaseError::InvalidVersion {
            version: version_text.clone(),
            reason: e.to_string(),
        })?;

        let dir = self.root.join(&self.config.secondary.directory);
        self.invoke(
            Invocation::new(Tool::SecondaryManifest, &self.config.tools.yarn)
                .args([
                    "version",
                    "--new-version",
                    version_text.as_str(),
                    "--no-git-tag-version",
                ])
                .current_dir(&dir),
        )?;
        self.invoke(
            Invocation::new(Tool::SecondaryManifest, &self.config.tools.napi)
                .arg("version")
                .current_dir(&dir),
        )?;

        Ok(self.done(&format!(
            "set {} manifests to {}",
            self.config.secondary.directory.display(),
            version_text
        )))
    }

    fn generate_changelog(&self, ctx: &PipelineContext) -> Result<Outcome> {
        let tag = self.tag(&ctx.next_version()?);
        let paths = &self.config.paths;
        self.invoke(
            Invocation::new(Tool::ChangelogGenerator, &self.config.tools.git_cliff)
                .arg("--config")
                .arg(paths.cliff_config.to_string_lossy())
                .args(["--tag", tag.as_str()])
                .arg("--output")
                .arg(paths.changelog.to_string_lossy())
                .current_dir(&self.root),
        )?;
        Ok(self.done(&format!("regenerated {} for {}", paths.changelog.display(), tag)))
    }

    fn configure_ci_identity(&self) -> Result<Outcome> {
        let Some(identity) = self.env.identity()? else {
            return Ok(Outcome::Skipped("not running under CI".to_string()));
        };

        for (key, value) in [("user.name", &identity.name), ("user.email", &identity.email)] {
            self.invoke(
                self.git()
                    .args(["config", "--global", key, value.as_str()]),
            )?;
        }
        Ok(self.done(&format!("committing as {} <{}>", identity.name, identity.email)))
    }

    fn commit_and_push(&self, ctx: &PipelineContext) -> Result<Outcome> {
        let tag = self.tag(&ctx.next_version()?);
        let message = format!("Bump version to {}", tag);

        self.invoke(self.git().args(["add", "--all"]))?;
        self.invoke(self.git().args(["commit", "-m", message.as_str()]))?;
        let mut push = self.git().arg("push");
        if let Some(remote) = &self.config.git.remote {
            push = push.arg(remote.as_str());
        }
        self.invoke(push)?;

        Ok(self.done(&format!("pushed commit '{}'", message)))
    }

    fn extract_release_notes(&self, ctx: &mut PipelineContext) -> Result<Outcome> {
        let next = ctx.next_version()?;
        let tag = self.tag(&next);
        let path = self.root.join(&self.config.paths.changelog);

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if self.dry_run => {
                ui::display_warning(&format!("cannot read {}: {}", path.display(), e));
                return Ok(Outcome::Skipped("changelog is not available".to_string()));
            }
            Err(e) => {
                return Err(ReleaseError::Io(std::io::Error::new(
                    e.kind(),
                    format!("cannot read changelog {}: {}", path.display(), e),
                )))
            }
        };

        let note = changelog::extract(&text, &next.to_string());
        if !note.is_found() {
            if self.dry_run {
                ui::display_warning(&format!(
                    "{} has no section for {} yet; it is only regenerated in a real run",
                    self.config.paths.changelog.display(),
                    next
                ));
                return Ok(Outcome::Skipped(format!("no changelog section for {}", tag)));
            }
            return Err(ReleaseError::ReleaseNotesNotFound { tag });
        }

        let detail = format!("release title '{}'", note.title);
        ctx.release_note = Some(note);
        Ok(Outcome::Completed(detail))
    }

    fn create_release(&self, ctx: &PipelineContext) -> Result<Outcome> {
        let tag = self.tag(&ctx.next_version()?);
        let (title, notes) = match &ctx.release_note {
            Some(note) => (note.title.clone(), note.body.clone()),
            None if self.dry_run => (tag.clone(), String::new()),
            None => return Err(ReleaseError::ReleaseNotesNotFound { tag }),
        };

        let mut invocation = Invocation::new(Tool::ReleaseHost, &self.config.tools.gh)
            .args(["release", "create", tag.as_str()])
            .args(["--title", title.as_str()])
            .args(["--notes", notes.as_str()])
            .current_dir(&self.root);
        if ctx.component.is_prerelease() {
            invocation = invocation.arg("--prerelease");
        }

        // History is already pushed at this point, so every failure here is
        // reported as a release-creation failure.
        self.invoke(invocation).map_err(|e| {
            let exit_status = e.tool_status();
            if exit_status.is_none() {
                ui::display_warning(&e.to_string());
            }
            ReleaseError::ReleaseCreation {
                tag: tag.clone(),
                exit_status,
            }
        })?;

        Ok(self.done(&format!("created release {}", tag)))
    }

    fn invoke(&self, invocation: Invocation) -> Result<()> {
        ui::display_command(&invocation.command_line());
        if self.dry_run {
            return Ok(());
        }

        let status = self.runner.run(&invocation)?;
        if status.success() {
            Ok(())
        } else {
            Err(ReleaseError::ExternalTool {
                tool: invocation.tool,
                exit_status: status.code,
            })
        }
    }

    fn done(&self, detail: &str) -> Outcome {
        if self.dry_run {
            Outcome::Simulated(format!("would have {}", detail))
        } else {
            Outcome::Completed(detail.to_string())
        }
    }

    fn git(&self) -> Invocation {
        Invocation::new(Tool::Git, &self.config.tools.git).current_dir(&self.root)
    }

    fn tag(&self, version: &Version) -> String {
        version.tag(&self.config.release.tag_prefix)
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.config.paths.manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::RecordingRunner;

    #[test]
    fn test_stage_order_and_numbers() {
        let names: Vec<&str> = STAGES.iter().map(|d| d.stage.name()).collect();
        assert_eq!(
            names,
            vec![
                "parse-version",
                "compute-version",
                "rewrite-manifest",
                "refresh-lockfile",
                "sync-secondary-manifests",
                "generate-changelog",
                "configure-ci-identity",
                "commit-and-push",
                "extract-release-notes",
                "create-release",
            ]
        );
        assert_eq!(Stage::ParseVersion.number(), 1);
        assert_eq!(Stage::ConfigureCiIdentity.number(), 7);
        assert_eq!(Stage::CreateRelease.number(), 10);
    }

    #[test]
    fn test_context_accessors_before_stages_run() {
        let ctx = PipelineContext::new(Component::Patch);
        assert!(ctx.current_version().is_err());
        assert!(ctx.next_version().is_err());
        assert!(ctx.mutated_stages().is_empty());
    }

    #[test]
    fn test_mutated_stages_ignore_skipped_and_read_only() {
        let mut ctx = PipelineContext::new(Component::Patch);
        ctx.record(Stage::ParseVersion, Outcome::Completed(String::new()));
        ctx.record(Stage::RewriteManifest, Outcome::Completed(String::new()));
        ctx.record(Stage::SyncSecondaryManifests, Outcome::Skipped(String::new()));
        ctx.record(Stage::GenerateChangelog, Outcome::Simulated(String::new()));
        ctx.record(Stage::CommitAndPush, Outcome::Failed(String::new()));

        assert_eq!(ctx.mutated_stages(), vec![Stage::RewriteManifest]);
    }

    #[test]
    fn test_preview_failures_name_the_stage() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        let runner = RecordingRunner::new();
        let pipeline = ReleasePipeline::new(dir.path(), &config, &runner, CiEnvironment::default());

        fs::write(dir.path().join("Cargo.toml"), "[package]\nversion = \"1.0.0\"\n").unwrap();
        let err = pipeline.preview(Component::Patch).unwrap_err();
        assert_eq!(err.stage, Stage::ParseVersion);
        assert!(err.to_string().starts_with("Stage 'parse-version' failed"));

        fs::write(dir.path().join("Cargo.toml"), "version = \"1.4294967295.0\" # auto\n").unwrap();
        let err = pipeline.preview(Component::Minor).unwrap_err();
        assert_eq!(err.stage, Stage::ComputeVersion);
        assert!(matches!(err.cause, ReleaseError::InvalidVersion { .. }));
    }

    #[test]
    fn test_preview_does_not_touch_anything() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = "[package]\nversion = \"0.4.1\" # auto\n";
        fs::write(dir.path().join("Cargo.toml"), manifest).unwrap();
        let config = Config::default();
        let runner = RecordingRunner::new();

        let pipeline = ReleasePipeline::new(dir.path(), &config, &runner, CiEnvironment::default());
        let (current, next) = pipeline.preview(Component::Minor).unwrap();

        assert_eq!(current, Version::new(0, 4, 1));
        assert_eq!(next, Version::new(0, 5, 0));
        assert!(runner.invocations().is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("Cargo.toml")).unwrap(),
            manifest
        );
    }
}
