// src/exec/task_runner.rs

//! Single recipe process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::RecipeOutcome;
use crate::exec::backend::RecipeJob;

/// Run one recipe to completion.
///
/// The recipe sees the target, the full input list and the out-of-date
/// input list both as positional parameters (`$1`, `$2`, `$3`) and as the
/// `TARGET`, `INPUTS` and `OODATE` environment variables. Its stdout and
/// stderr are forwarded line by line; all output is drained before this
/// returns so the next target's output never interleaves.
pub async fn run_recipe(shell: &str, job: &RecipeJob) -> Result<RecipeOutcome> {
    let inputs = job.inputs_joined();
    let oodate = job.out_of_date_joined();

    info!(rule = %job.target, shell = %shell, "starting recipe");
    debug!(rule = %job.target, recipe = %job.recipe, inputs = %inputs, oodate = %oodate, "recipe arguments");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&job.recipe);
        c
    } else {
        let mut c = Command::new(shell);
        c.arg("-c")
            .arg(&job.recipe)
            .arg("hashmake")
            .arg(&job.target)
            .arg(&inputs)
            .arg(&oodate);
        c
    };

    cmd.current_dir(&job.workdir)
        .env("TARGET", &job.target)
        .env("INPUTS", &inputs)
        .env("OODATE", &oodate)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning recipe for target '{}'", job.target))?;

    let forwarders: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|out| forward_lines(out, false)),
        child.stderr.take().map(|err| forward_lines(err, true)),
    ]
    .into_iter()
    .flatten()
    .collect();

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for recipe of target '{}'", job.target))?;

    for handle in forwarders {
        let _ = handle.await;
    }

    let code = status.code().unwrap_or(-1);
    info!(
        rule = %job.target,
        exit_code = code,
        success = status.success(),
        "recipe exited"
    );

    Ok(if status.success() {
        RecipeOutcome::Success
    } else {
        RecipeOutcome::Failed(code)
    })
}

fn forward_lines<R>(stream: R, to_stderr: bool) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
    })
}
