//! Kubernetes exec operations
//!
//! Run one-shot commands in a workload container over the exec subresource.

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::{K8sError, K8sResult};
use crate::kubernetes::types::ExecOutput;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{Api, AttachParams};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Wrap a shell command line for `exec`
pub fn shell_command(command: &str) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), command.to_string()]
}

/// Execute a command in a pod's first container and collect its output
pub async fn exec_command(
    client: &K8sClient,
    namespace: &str,
    pod_name: &str,
    command: Vec<String>,
) -> K8sResult<ExecOutput> {
    let pods: Api<Pod> = Api::namespaced(client.inner().clone(), namespace);

    let attach_params = AttachParams::default()
        .stdin(false)
        .stdout(true)
        .stderr(true)
        .tty(false);

    let mut attached = pods.exec(pod_name, command, &attach_params).await?;

    let stdout_reader = attached.stdout();
    let stderr_reader = attached.stderr();
    let (stdout, stderr) = tokio::join!(read_all(stdout_reader), read_all(stderr_reader));

    let status = attached
        .take_status()
        .ok_or_else(|| K8sError::ExecError("No status channel".to_string()))?
        .await
        .ok_or_else(|| K8sError::ExecError("Status channel closed".to_string()))?;

    if let Err(e) = attached.join().await {
        tracing::debug!(pod = %pod_name, "Exec session ended with error: {}", e);
    }

    Ok(ExecOutput {
        stdout,
        stderr,
        exit_code: exit_code(&status),
    })
}

async fn read_all(reader: Option<impl AsyncRead + Unpin>) -> String {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        if let Err(e) = reader.read_to_end(&mut buf).await {
            tracing::debug!("Failed to read exec stream: {}", e);
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Exit code from the final exec status
///
/// Non-zero exits arrive as `Failure` with an `ExitCode` cause.
fn exit_code(status: &Status) -> i32 {
    if status.status.as_deref() == Some("Success") {
        return 0;
    }

    status
        .details
        .as_ref()
        .and_then(|d| d.causes.as_ref())
        .and_then(|causes| {
            causes
                .iter()
                .find(|c| c.reason.as_deref() == Some("ExitCode"))
                .and_then(|c| c.message.as_deref())
                .and_then(|m| m.trim().parse().ok())
        })
        .unwrap_or(1)
}
