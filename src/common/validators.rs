use crate::common::{
    constants::{NAMESPACE_MAX_LEN, RELEASE_NAME_MAX_LEN, RFC1123_LABEL_EXPR},
    error::{InvalidNamespace, InvalidReleaseName, RegexCompile, Result},
};
use regex::Regex;
use snafu::{ensure, ResultExt};

/// Validates that a namespace is a well-formed Kubernetes namespace name.
/// This does not check for the namespace's existence on the cluster.
pub(crate) fn validate_namespace(namespace: &str) -> Result<()> {
    ensure!(
        namespace.len() <= NAMESPACE_MAX_LEN && rfc1123_label()?.is_match(namespace),
        InvalidNamespace { namespace }
    );
    Ok(())
}

/// Validates that a release name is acceptable to helm before any backend
/// command is attempted with it.
pub(crate) fn validate_release_name(release_name: &str) -> Result<()> {
    ensure!(
        release_name.len() <= RELEASE_NAME_MAX_LEN && rfc1123_label()?.is_match(release_name),
        InvalidReleaseName { release_name }
    );
    Ok(())
}

fn rfc1123_label() -> Result<Regex> {
    Regex::new(RFC1123_LABEL_EXPR).context(RegexCompile {
        expression: RFC1123_LABEL_EXPR.to_string(),
    })
}
