//! Toolchain provisioning and package resolution.
//!
//! The app domain never touches the SDK directly; it asks a [`Toolchain`] for
//! a provisioned handle and for the packages a project builds into.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Tracing target for toolchain operations.
pub(crate) const TOOLCHAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::toolchain");

/// Errors raised while provisioning the toolchain or resolving packages.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// No SDK root was configured.
    #[error("toolchain is not configured; set --sdk-root or DEVHOST_SDK_ROOT")]
    NotConfigured,
    /// The configured SDK root is missing.
    #[error("toolchain root does not exist: {}", path.display())]
    MissingRoot {
        /// Configured root.
        path: PathBuf,
    },
    /// The project's packages could not be determined.
    #[error("failed to resolve packages for {}: {message}", project.display())]
    Resolve {
        /// Project directory.
        project: PathBuf,
        /// Failure description.
        message: String,
    },
}

/// Provisioned toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainHandle {
    root: PathBuf,
}

impl ToolchainHandle {
    /// Creates a handle rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the toolchain.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Deployable unit built from a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    /// Package name.
    pub name: String,
    /// Directory the package was resolved from.
    pub project_directory: PathBuf,
}

/// Provisions the toolchain and resolves project packages.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Ensures the toolchain is available, downloading it if required.
    async fn download(&self) -> Result<ToolchainHandle, ToolchainError>;

    /// Resolves the packages built from `project_directory`.
    async fn resolve_packages(
        &self,
        project_directory: &Path,
    ) -> Result<Vec<PackageRef>, ToolchainError>;
}

/// Toolchain backed by a pre-provisioned SDK directory.
#[derive(Debug, Clone, Default)]
pub struct LocalToolchain {
    sdk_root: Option<PathBuf>,
}

impl LocalToolchain {
    /// Creates a toolchain rooted at `sdk_root`.
    pub fn new(sdk_root: Option<PathBuf>) -> Self {
        Self { sdk_root }
    }
}

#[async_trait]
impl Toolchain for LocalToolchain {
    async fn download(&self) -> Result<ToolchainHandle, ToolchainError> {
        let root = self.sdk_root.as_ref().ok_or(ToolchainError::NotConfigured)?;
        let is_dir = tokio::fs::metadata(root)
            .await
            .is_ok_and(|metadata| metadata.is_dir());
        if !is_dir {
            return Err(ToolchainError::MissingRoot { path: root.clone() });
        }
        debug!(target: TOOLCHAIN_TARGET, root = %root.display(), "toolchain available");
        Ok(ToolchainHandle::new(root.clone()))
    }

    async fn resolve_packages(
        &self,
        project_directory: &Path,
    ) -> Result<Vec<PackageRef>, ToolchainError> {
        let name = project_directory
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ToolchainError::Resolve {
                project: project_directory.to_path_buf(),
                message: String::from("directory has no usable name"),
            })?;
        Ok(vec![PackageRef {
            name: name.to_owned(),
            project_directory: project_directory.to_path_buf(),
        }])
    }
}
