//! 7-Zip codec driven through an external binary.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::capabilities::SevenZipTool;
use super::error::FormatError;
use super::native::{collect_entries, finish_result};
use super::traits::{Packer, Unpacker};
use super::types::{PackRequest, PackResult};

/// 7-Zip codec.
#[derive(Debug, Clone)]
pub struct SevenZipCodec {
    tool: SevenZipTool,
}

impl SevenZipCodec {
    /// Creates a codec that runs the given 7-Zip binary.
    pub fn new(tool: SevenZipTool) -> Self {
        Self { tool }
    }

    /// The binary this codec runs.
    pub fn tool(&self) -> &SevenZipTool {
        &self.tool
    }

    /// Builds `7z a` arguments. Paths are relative to the working directory,
    /// which the caller sets to the request's root.
    fn build_pack_args(&self, request: &PackRequest, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "a".into(),
            "-t7z".into(),
            "-bd".into(), // no progress indicator
            "-y".into(),
            output.as_os_str().to_owned(),
        ];
        match &request.base_dir {
            Some(base) => args.push(base.as_os_str().to_owned()),
            None => args.push("*".into()),
        }
        args
    }

    fn build_unpack_args(&self, archive: &Path, dest_dir: &Path) -> Vec<OsString> {
        let mut out = OsString::from("-o");
        out.push(dest_dir.as_os_str());
        vec![
            "x".into(),
            "-y".into(),
            "-bd".into(),
            out,
            archive.as_os_str().to_owned(),
        ]
    }

    async fn run(&self, args: Vec<OsString>, cwd: Option<&Path>) -> Result<(), FormatError> {
        let mut command = Command::new(&self.tool.path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FormatError::ToolNotFound {
                    path: self.tool.path.clone(),
                }
            } else {
                FormatError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(FormatError::tool_failed(
                format!("7-Zip exited with code: {:?}", output.status.code()),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf, FormatError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[async_trait]
impl Packer for SevenZipCodec {
    fn name(&self) -> &str {
        "7zip"
    }

    async fn pack(&self, request: PackRequest) -> Result<PackResult, FormatError> {
        // Also verifies the source exists before spawning anything.
        let entries = collect_entries(&request)?.len();

        let output = absolute(&request.output)?;
        let args = self.build_pack_args(&request, &output);
        self.run(args, Some(&request.root_dir)).await?;

        finish_result(output, entries)
    }
}

#[async_trait]
impl Unpacker for SevenZipCodec {
    fn name(&self) -> &str {
        "7zip"
    }

    async fn unpack(&self, archive: &Path, dest_dir: &Path) -> Result<(), FormatError> {
        let archive = absolute(archive)?;
        let dest_dir = absolute(dest_dir)?;
        tokio::fs::create_dir_all(&dest_dir).await?;
        let args = self.build_unpack_args(&archive, &dest_dir);
        self.run(args, None).await
    }
}
