use crate::{
    common::{
        constants::{CHART_METADATA_FILE, HELM_COMMAND, OCI_SCHEME_PREFIX},
        error::{
            ChartLoad, ChartNotLocatable, HelmCommand, InvalidChartRepoUrl, OpeningChartFile,
            Result, WorkdirSetup,
        },
    },
    release::HelmDeployment,
    vec_to_strings,
};
use async_trait::async_trait;
use semver::Version;
use serde::Deserialize;
use snafu::{ensure, ResultExt};
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tokio::process::Command;
use url::Url;

/// Chart source coordinates assembled while deciding where a chart comes from.
#[derive(Clone, Debug, Default)]
pub struct ChartPathOptions {
    pub(crate) version: String,
    pub(crate) repo_url: Option<String>,
    pub(crate) registry_config: Option<PathBuf>,
}

impl ChartPathOptions {
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url.as_deref()
    }
}

/// Chart metadata, deserialized from the chart's Chart.yaml.
#[derive(Clone, Debug, Deserialize)]
pub struct ChartMetadata {
    name: String,
    #[serde(deserialize_with = "Version::deserialize")]
    version: Version,
}

impl ChartMetadata {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

/// A located and loaded chart, ready to be handed to install or upgrade.
#[derive(Clone, Debug)]
pub struct ChartBundle {
    dir: PathBuf,
    metadata: ChartMetadata,
}

impl ChartBundle {
    /// Directory of the unpacked chart.
    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    pub fn metadata(&self) -> &ChartMetadata {
        &self.metadata
    }
}

/// Returns true if the chart source address points at an OCI registry rather
/// than a classic HTTP chart repository.
pub fn is_oci(chart_url: &str) -> bool {
    chart_url.starts_with(OCI_SCHEME_PREFIX)
}

/// Locates a chart artifact from its declared source and makes it available
/// as an unpacked directory.
#[async_trait]
pub trait ChartLocator: Send + Sync {
    async fn locate(
        &self,
        chart_ref: &str,
        options: &ChartPathOptions,
        dest: &Path,
    ) -> Result<PathBuf>;
}

/// Resolves a deployment's chart: decides the source kind, locates the
/// artifact and loads its metadata. Every call re-resolves, since chart
/// content may change between calls even for the same release name.
pub(crate) async fn resolve_chart(
    locator: &dyn ChartLocator,
    options: &mut ChartPathOptions,
    deployment: &HelmDeployment,
    scratch: &Path,
) -> Result<ChartBundle> {
    options.version = deployment.chart_version().to_string();

    // For an OCI source the chart URL is already the fully-qualified chart
    // reference; otherwise the URL is a repository to look the chart name up in.
    let chart_ref = if is_oci(deployment.chart_url()) {
        deployment.chart_url()
    } else {
        Url::parse(deployment.chart_url()).context(InvalidChartRepoUrl {
            chart_url: deployment.chart_url().to_string(),
        })?;
        options.repo_url = Some(deployment.chart_url().to_string());
        deployment.chart_name()
    };

    if scratch.exists() {
        fs::remove_dir_all(scratch).context(WorkdirSetup {
            path: scratch.to_path_buf(),
        })?;
    }
    fs::create_dir_all(scratch).context(WorkdirSetup {
        path: scratch.to_path_buf(),
    })?;

    let chart_dir = locator.locate(chart_ref, options, scratch).await?;
    load_chart(chart_dir.as_path(), chart_ref, options.version())
}

/// Loads a located chart's metadata. A missing chart directory means the
/// locate step did not produce one and is reported as such; a present but
/// unparsable chart is a loading failure.
pub(crate) fn load_chart(dir: &Path, chart_ref: &str, version: &str) -> Result<ChartBundle> {
    ensure!(
        dir.is_dir(),
        ChartNotLocatable {
            chart_ref: chart_ref.to_string(),
            chart_version: version.to_string(),
            detail: format!("no unpacked chart at {}", dir.display()),
        }
    );

    let filepath = dir.join(CHART_METADATA_FILE);
    let file = File::open(filepath.as_path()).context(OpeningChartFile {
        filepath: filepath.clone(),
    })?;
    let metadata: ChartMetadata =
        serde_yaml::from_reader(file).context(ChartLoad { filepath })?;

    Ok(ChartBundle {
        dir: dir.to_path_buf(),
        metadata,
    })
}

/// The last path segment of a chart reference, without any tag. This is the
/// directory name `helm pull --untar` unpacks into.
fn chart_base_name(chart_ref: &str) -> &str {
    let base = chart_ref
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(chart_ref);
    base.split(':').next().unwrap_or(base)
}

/// Production chart locator. Fetches the chart with `helm pull` and unpacks
/// it under the destination directory.
#[derive(Default)]
pub struct HelmChartLocator;

#[async_trait]
impl ChartLocator for HelmChartLocator {
    async fn locate(
        &self,
        chart_ref: &str,
        options: &ChartPathOptions,
        dest: &Path,
    ) -> Result<PathBuf> {
        let mut args = vec_to_strings![
            "pull",
            chart_ref,
            "--version",
            options.version,
            "--untar",
            "--untardir",
            dest.display()
        ];
        if let Some(repo_url) = options.repo_url() {
            args.push("--repo".to_string());
            args.push(repo_url.to_string());
        }
        if let Some(registry_config) = options.registry_config.as_deref() {
            args.push("--registry-config".to_string());
            args.push(registry_config.display().to_string());
        }

        tracing::debug!(command = HELM_COMMAND, ?args, "Pulling chart");
        let output = Command::new(HELM_COMMAND)
            .args(args.iter())
            .kill_on_drop(true)
            .output()
            .await
            .context(HelmCommand {
                command: HELM_COMMAND.to_string(),
                args: args.clone(),
            })?;
        ensure!(
            output.status.success(),
            ChartNotLocatable {
                chart_ref: chart_ref.to_string(),
                chart_version: options.version.clone(),
                detail: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        );

        Ok(dest.join(chart_base_name(chart_ref)))
    }
}
