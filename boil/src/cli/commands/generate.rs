//! `boil gen`: run one or more generation requests through the engine

use crate::cli::app::GenerateArgs;
use crate::cli::progress::{ProgressMode, ProgressView};
use crate::config::BoilConfig;
use anyhow::{Context, Result, bail};
use boil_core::fs::{FileStore, render_tree};
use boil_core::{
    ChannelPublisher, Engine, EngineConfig, GeneratedProject, GenerationRequest, PipelineError,
    ProviderFactory, ResultSlot, ShutdownOutcome,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Batch file layout: one `[[request]]` table per project
#[derive(Debug, Deserialize)]
struct RequestFile {
    #[serde(default)]
    request: Vec<GenerationRequest>,
}

/// A request together with where its output goes
#[derive(Debug)]
struct PlannedRun {
    request: GenerationRequest,
    destination: PathBuf,
}

/// Handle project generation
pub async fn execute(args: GenerateArgs, config: BoilConfig) -> Result<()> {
    let requests = build_requests(&args, &config, |key| std::env::var(key).ok())?;
    let plan = plan_outputs(requests, &output_dir(&args, &config), args.zip || config.archive);

    if args.dry_run {
        println!("🔍 Dry run mode - no files will be created");
        for run in &plan {
            println!("  {} -> {}", run.request.description, run.destination.display());
        }
        return Ok(());
    }

    let workers = args.workers.unwrap_or(config.workers).clamp(1, plan.len().max(1));
    let (publisher, receiver) = ChannelPublisher::new();
    let factory = ProviderFactory {
        openai_base_url: config.openai_base_url.clone(),
        timeout_secs: config.request_timeout_secs,
    };
    let engine = Engine::new(
        EngineConfig { queue_capacity: config.queue_capacity },
        Arc::new(factory),
        Arc::new(publisher),
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());
    engine.start(workers, cancel.clone()).await?;

    let mode = if args.json { ProgressMode::Json } else { ProgressMode::Bars };
    let view = ProgressView::spawn(receiver, mode);

    let timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let slots = match submit_all(&engine, plan, &view).await {
        Ok(slots) => slots,
        Err(e) => {
            cancel.cancel();
            engine.shutdown(timeout).await;
            view.finish().await;
            return Err(e);
        }
    };

    let total = slots.len();
    let mut finished = Vec::with_capacity(total);
    for (slot, destination) in slots {
        finished.push((slot.wait().await, destination));
    }
    view.finish().await;

    if engine.shutdown(timeout).await == ShutdownOutcome::TimedOut {
        warn!("Some workers were still busy after {:?}", timeout);
    }

    let mut failures = 0;
    let mut cancelled = 0;
    for (outcome, destination) in finished {
        match outcome {
            Ok(project) => {
                if let Err(e) = write_output(project, destination, args.json).await {
                    eprintln!("❌ {:#}", e);
                    failures += 1;
                }
            }
            Err(e) if e.is_cancelled() => cancelled += 1,
            Err(e) => {
                report_failure(&e, args.json);
                failures += 1;
            }
        }
    }

    if cancelled > 0 {
        eprintln!("⚠️  {} of {} runs cancelled", cancelled, total);
    }
    if failures > 0 || cancelled > 0 {
        bail!("{} of {} runs did not complete", failures + cancelled, total);
    }

    if !args.json {
        println!("✨ Generated {} project(s)", total);
    }
    Ok(())
}

/// Queue every planned run, registering each with the progress view
async fn submit_all(
    engine: &Engine,
    plan: Vec<PlannedRun>,
    view: &ProgressView,
) -> Result<Vec<(ResultSlot, PathBuf)>> {
    let mut slots = Vec::with_capacity(plan.len());
    for run in plan {
        let name = run.request.formatted_name();
        let slot = engine
            .submit(run.request)
            .await
            .with_context(|| format!("Failed to queue project '{}'", name))?;
        view.register(slot.run_id(), &name);
        slots.push((slot, run.destination));
    }
    Ok(slots)
}

/// Turn the arguments (or the batch file) into validated requests
fn build_requests(
    args: &GenerateArgs,
    config: &BoilConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Vec<GenerationRequest>> {
    let mut requests = match &args.file {
        Some(path) => read_request_file(path)?,
        None => {
            let description = args.description.clone().unwrap_or_default();
            let name = args
                .name
                .clone()
                .or_else(|| regex_utils::project_name::extract(&description))
                .unwrap_or_else(|| boil_core::request::DEFAULT_PROJECT_NAME.to_string());
            vec![GenerationRequest::new(description).with_project_name(name)]
        }
    };

    let from_file = args.file.is_some();
    for request in &mut requests {
        // Flags override the file, the file overrides the config
        if let Some(model) = &args.model {
            request.model = model.clone();
        } else if !from_file {
            request.model = config.model.clone();
        }

        request.git_repo |= args.git || config.defaults.git_repo;
        request.git_ignore |= args.gitignore || config.defaults.git_ignore;
        request.readme |= args.readme || config.defaults.readme;
        request.dockerfile |= args.dockerfile || config.defaults.dockerfile;

        if request.api_key.is_empty() {
            request.api_key = config.api_key_for(&request.model, &lookup).unwrap_or_default();
        }

        request
            .validate()
            .with_context(|| format!("Invalid request for project '{}'", request.project_name))?;
    }

    if requests.is_empty() {
        bail!("No requests to run");
    }
    Ok(requests)
}

fn read_request_file(path: &Path) -> Result<Vec<GenerationRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    let file: RequestFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse request file {}", path.display()))?;
    debug!("Loaded {} requests from {}", file.request.len(), path.display());
    Ok(file.request)
}

fn output_dir(args: &GenerateArgs, config: &BoilConfig) -> PathBuf {
    args.output.clone().unwrap_or_else(|| config.output_dir.clone())
}

/// Assign each request a destination, suffixing repeated names
fn plan_outputs(requests: Vec<GenerationRequest>, output_dir: &Path, archive: bool) -> Vec<PlannedRun> {
    let mut taken = HashSet::new();

    requests
        .into_iter()
        .map(|request| {
            let base = request.formatted_name();
            let mut name = base.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{}-{}", base, n);
                n += 1;
            }

            let destination = if archive {
                output_dir.join(format!("{}.zip", name))
            } else {
                output_dir.join(&name)
            };
            PlannedRun { request, destination }
        })
        .collect()
}

async fn write_output(project: GeneratedProject, destination: PathBuf, json: bool) -> Result<()> {
    let name = project.project_name.clone();
    let files = project.files_generated.len();
    let elapsed = project.elapsed;

    let tree = tokio::task::spawn_blocking(move || -> Result<String> {
        let tree = project.store.tree()?;
        if destination.extension().is_some_and(|ext| ext == "zip") {
            project.store.export_archive(&destination)?;
        } else {
            project.store.copy_to(&destination)?;
        }
        info!("Wrote {} to {}", project.project_name, destination.display());
        Ok(render_tree(&project.project_name, &tree))
    })
    .await
    .context("Output task failed")?
    .with_context(|| format!("Failed to write project '{}'", name))?;

    if json {
        let line = serde_json::json!({
            "project": name,
            "files": files,
            "elapsed_ms": elapsed.as_millis() as u64,
        });
        println!("{}", line);
    } else {
        println!("\n✅ {} ({} files in {:.1}s)\n{}", name, files, elapsed.as_secs_f64(), tree);
    }
    Ok(())
}

fn report_failure(error: &PipelineError, json: bool) {
    if json {
        let line = serde_json::json!({
            "error": error.to_string(),
            "stage": error.stage(),
        });
        println!("{}", line);
    } else {
        eprintln!("❌ {}", error);
    }
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining stages");
            cancel.cancel();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::app::{Cli, Commands};
    use clap::Parser;
    use tempfile::TempDir;

    fn gen_args(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["boil", "gen"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Gen(args) => args,
            Commands::Config => panic!("expected gen"),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_single_request_from_flags() {
        let args = gen_args(&["create a cli called fastgrep", "--readme", "-m", "claude-3-haiku"]);
        let lookup = |key: &str| (key == "ANTHROPIC_API_KEY").then(|| "sk-ant".to_string());

        let requests = build_requests(&args, &BoilConfig::default(), lookup).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].project_name, "fastgrep");
        assert_eq!(requests[0].model, "claude-3-haiku");
        assert_eq!(requests[0].api_key, "sk-ant");
        assert!(requests[0].readme);
        assert!(!requests[0].dockerfile);
    }

    #[test]
    fn test_config_defaults_apply() {
        let args = gen_args(&["a todo api"]);
        let mut config = BoilConfig::default();
        config.defaults.git_ignore = true;
        config.model = "gpt-4o".to_string();

        let requests = build_requests(&args, &config, no_env).unwrap();
        assert_eq!(requests[0].project_name, "my-project");
        assert_eq!(requests[0].model, "gpt-4o");
        assert!(requests[0].git_ignore);
    }

    #[test]
    fn test_batch_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requests.toml");
        std::fs::write(
            &path,
            r#"
[[request]]
description = "a url shortener in go"
project_name = "shorty"
dockerfile = true

[[request]]
description = "a chat server"
model = "claude-3-5-sonnet-20241022"
"#,
        )
        .unwrap();

        let args = gen_args(&["--file", path.to_str().unwrap()]);
        let requests = build_requests(&args, &BoilConfig::default(), no_env).unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].project_name, "shorty");
        assert!(requests[0].dockerfile);
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[1].model, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn test_invalid_batch_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("requests.toml");
        std::fs::write(&path, "[[request]]\nproject_name = \"empty\"\n").unwrap();

        let args = gen_args(&["--file", path.to_str().unwrap()]);
        assert!(build_requests(&args, &BoilConfig::default(), no_env).is_err());
    }

    #[tokio::test]
    async fn test_submit_failure_reports_project() {
        let (publisher, receiver) = ChannelPublisher::new();
        let factory = ProviderFactory { openai_base_url: None, timeout_secs: None };
        let engine = Engine::new(EngineConfig::default(), Arc::new(factory), Arc::new(publisher));
        let view = ProgressView::spawn(receiver, ProgressMode::Json);

        let cancel = CancellationToken::new();
        engine.start(1, cancel.clone()).await.unwrap();
        cancel.cancel();

        let plan = plan_outputs(
            vec![GenerationRequest::new("a todo api").with_project_name("todo")],
            Path::new("out"),
            false,
        );
        let err = submit_all(&engine, plan, &view).await.unwrap_err();
        assert!(err.to_string().contains("todo"));

        assert_eq!(engine.shutdown(Duration::from_secs(1)).await, ShutdownOutcome::Clean);
        assert_eq!(engine.state().await, boil_core::EngineState::Stopped);
        view.finish().await;
    }

    #[test]
    fn test_plan_outputs_dedupes_names() {
        let requests = vec![
            GenerationRequest::new("a").with_project_name("api"),
            GenerationRequest::new("b").with_project_name("api"),
            GenerationRequest::new("c").with_project_name("2048"),
        ];

        let plan = plan_outputs(requests, Path::new("out"), false);
        let destinations: Vec<_> = plan.iter().map(|p| p.destination.clone()).collect();
        assert_eq!(
            destinations,
            vec![PathBuf::from("out/api"), PathBuf::from("out/api-2"), PathBuf::from("out/project-2048")]
        );

        let plan = plan_outputs(vec![GenerationRequest::new("a")], Path::new("out"), true);
        assert_eq!(plan[0].destination, PathBuf::from("out/my-project.zip"));
    }
}
