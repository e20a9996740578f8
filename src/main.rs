use std::path::{Path, PathBuf};
use std::process::ExitCode;

use structopt::StructOpt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filter_rules::config::settings;
use filter_rules::model::enums::ScriptKind;
use filter_rules::store::{self, rule_store};

/// Check filter rule files before they are handed to the script compiler.
#[derive(StructOpt)]
#[structopt(name = "filter-rules")]
struct Opt {
    /// Treat the files as admin scripts, allowing header edits.
    #[structopt(long)]
    admin: bool,

    /// Write the normalized rules back to each file that passes.
    #[structopt(long)]
    write: bool,

    /// JSON rule files.
    #[structopt(parse(from_os_str), required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let opt = Opt::from_args();
    let settings = settings::load_settings();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        commit = env!("GIT_COMMIT"),
        built = env!("BUILD_DATE"),
        "filter-rules starting"
    );

    let script = if opt.admin {
        ScriptKind::Admin
    } else {
        settings.script_kind
    };

    let mut failed = 0;
    for path in &opt.files {
        match check_file(path, script, opt.write) {
            Ok(count) => info!(path = %path.display(), rules = count, "ok"),
            Err(e) => {
                error!(path = %path.display(), "{e}");
                failed += 1;
            }
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn check_file(path: &Path, script: ScriptKind, write: bool) -> Result<usize, store::StoreError> {
    let mut rules = rule_store::load_rules(path)?;
    rule_store::validate_rules(&mut rules, script)?;
    if write {
        rule_store::save_rules(path, &rules)?;
    }
    Ok(rules.len())
}
