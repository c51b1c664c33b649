use std::path::{Path, PathBuf};

use anyhow::Context;
use edu_config::EduConfig;

use crate::cli::GlobalFlags;
use crate::context::find_project_root;

/// Load `.env`, then layered config, with relative store paths anchored to
/// the project root.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<EduConfig> {
    let root = project_root(flags)?;
    load_project_dotenv(&root)?;

    let mut config = EduConfig::load_with_dotenv().context("failed to load edu config")?;
    anchor_paths(&mut config, &root);
    Ok(config)
}

fn project_root(flags: &GlobalFlags) -> anyhow::Result<PathBuf> {
    if let Some(project) = &flags.project {
        let project_path = PathBuf::from(project);
        let root = if project_path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == ".edu")
        {
            project_path
                .parent()
                .map_or_else(|| project_path.clone(), Path::to_path_buf)
        } else {
            project_path
        };
        return Ok(root);
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    Ok(find_project_root(&cwd).unwrap_or(cwd))
}

fn load_project_dotenv(root: &Path) -> anyhow::Result<()> {
    let env_path = root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}

/// Rebase relative store paths onto `root`. `:memory:` and absolute paths
/// are left alone.
pub fn anchor_paths(config: &mut EduConfig, root: &Path) {
    for path in [
        &mut config.graph.path,
        &mut config.documents.path,
        &mut config.audit.path,
        &mut config.audit.trail_dir,
    ] {
        if path.as_str() == ":memory:" || Path::new(path.as_str()).is_absolute() {
            continue;
        }
        *path = root.join(path.as_str()).to_string_lossy().into_owned();
    }
}
