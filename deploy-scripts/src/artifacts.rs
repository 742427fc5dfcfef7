//! Resolution of compiled contract artifacts by contract name.
//!
//! Both Hardhat (`artifacts/<source>/<Name>.json`, bytecode as a hex string)
//! and Foundry (`out/<source>/<Name>.json`, bytecode under `object`) layouts
//! are understood.

use std::{
    fs,
    path::{Component, Path, PathBuf},
    str::FromStr,
};

use alloy::{json_abi::JsonAbi, primitives::Bytes};
use serde::Deserialize;
use tracing::debug;

use crate::{
    constants::{ARTIFACT_EXTENSION, BUILD_INFO_DIR, LINK_PLACEHOLDER_PREFIX},
    errors::ScriptError,
};

/// A compiled contract definition
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    /// The name of the contract
    pub name: String,
    /// The contract's ABI
    pub abi: JsonAbi,
    /// The contract's creation bytecode, without constructor arguments
    pub bytecode: Bytes,
}

/// The subset of an artifact file needed for deployment
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    /// Only present in Hardhat artifacts
    #[serde(default)]
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: RawBytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    /// Hardhat
    Hex(String),
    /// Foundry
    Object { object: String },
}

/// Resolves contract names to artifacts under a root directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// The artifacts root directory
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store reading artifacts from `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load the artifact for the given contract.
    ///
    /// `name` is either a bare contract name, which must be unique under the
    /// root, or a fully qualified `path/to/Source.sol:Name`.
    pub fn resolve(&self, name: &str) -> Result<ContractArtifact, ScriptError> {
        let path = self.locate(name)?;
        debug!("resolved `{}` to {}", name, path.display());

        let contents = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;

        let contract_name = name.split_once(':').map_or(name, |(_, contract)| contract);
        parse_artifact(contract_name, &contents)
    }

    /// Find the artifact file for the given contract
    fn locate(&self, name: &str) -> Result<PathBuf, ScriptError> {
        if let Some((source, contract)) = name.split_once(':') {
            if !is_relative_to_root(source) || !is_relative_to_root(contract) {
                return Err(ScriptError::ArtifactNotFound(format!(
                    "`{name}` must name a source inside the artifacts directory"
                )));
            }

            let path = self
                .root
                .join(source)
                .join(format!("{contract}.{ARTIFACT_EXTENSION}"));

            return if path.is_file() {
                Ok(path)
            } else {
                Err(ScriptError::ArtifactNotFound(name.to_string()))
            };
        }

        let file_name = format!("{name}.{ARTIFACT_EXTENSION}");
        let mut matches = Vec::new();
        find_artifacts(&self.root, &file_name, &mut matches)?;
        matches.sort();

        match matches.len() {
            0 => Err(ScriptError::ArtifactNotFound(format!(
                "no artifact for `{}` under {}",
                name,
                self.root.display()
            ))),
            1 => Ok(matches.remove(0)),
            _ => {
                let candidates = matches
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");

                Err(ScriptError::ArtifactParsing(format!(
                    "multiple artifacts for `{name}`, use a fully qualified name: {candidates}"
                )))
            }
        }
    }
}

/// Whether `path` stays below the directory it is joined onto
fn is_relative_to_root(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Recursively collect every file named `file_name` under `dir`
fn find_artifacts(
    dir: &Path,
    file_name: &str,
    matches: &mut Vec<PathBuf>,
) -> Result<(), ScriptError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ScriptError::ArtifactNotFound(format!("{}: {}", dir.display(), e)))?;

    for entry in entries {
        let path = entry
            .map_err(|e| ScriptError::ArtifactNotFound(e.to_string()))?
            .path();

        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == BUILD_INFO_DIR) {
                continue;
            }
            find_artifacts(&path, file_name, matches)?;
        } else if path.file_name().is_some_and(|n| n == file_name) {
            matches.push(path);
        }
    }

    Ok(())
}

/// Parse the contents of an artifact file
pub fn parse_artifact(name: &str, contents: &str) -> Result<ContractArtifact, ScriptError> {
    let raw: RawArtifact =
        serde_json::from_str(contents).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

    let hex_code = match raw.bytecode {
        RawBytecode::Hex(code) => code,
        RawBytecode::Object { object } => object,
    };

    if hex_code.contains(LINK_PLACEHOLDER_PREFIX) {
        return Err(ScriptError::ArtifactParsing(format!(
            "`{name}` references unlinked libraries"
        )));
    }

    let bytecode =
        Bytes::from_str(&hex_code).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;

    if bytecode.is_empty() {
        return Err(ScriptError::ArtifactParsing(format!(
            "`{name}` has no creation bytecode, it may be abstract or an interface"
        )));
    }

    Ok(ContractArtifact {
        name: raw.contract_name.unwrap_or_else(|| name.to_string()),
        abi: raw.abi,
        bytecode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures(dir: &str) -> ArtifactStore {
        ArtifactStore::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(dir))
    }

    #[test]
    fn test_resolve_hardhat_artifact() {
        let artifact = fixtures("artifacts").resolve("RES_TOKEN").unwrap();

        assert_eq!(artifact.name, "RES_TOKEN");
        assert_eq!(artifact.abi.constructor().unwrap().inputs.len(), 2);
        assert!(!artifact.bytecode.is_empty());
    }

    #[test]
    fn test_resolve_skips_build_info_and_debug_files() {
        // `build-info` holds a decoy `Lock.json` and `Lock.dbg.json` sits next
        // to the real artifact
        let artifact = fixtures("artifacts").resolve("Lock").unwrap();
        assert_eq!(artifact.name, "Lock");
    }

    #[test]
    fn test_resolve_foundry_artifact() {
        let artifact = fixtures("out").resolve("Lock").unwrap();

        assert_eq!(artifact.name, "Lock");
        assert!(artifact.abi.constructor().is_some());
    }

    #[test]
    fn test_resolve_fully_qualified_name() {
        let store = fixtures("artifacts");

        let artifact = store.resolve("contracts/access/Ownable.sol:Ownable").unwrap();
        assert_eq!(artifact.name, "Ownable");

        assert!(matches!(
            store.resolve("contracts/Missing.sol:Ownable"),
            Err(ScriptError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_qualified_name_cannot_leave_root() {
        let store = fixtures("artifacts/contracts");

        for name in [
            "../contracts/Lock.sol:Lock",
            "Lock.sol/../../contracts/Lock.sol:Lock",
            "/etc/Lock.sol:Lock",
            "Lock.sol:../Lock.sol/Lock",
            ":Lock",
        ] {
            assert!(
                matches!(store.resolve(name), Err(ScriptError::ArtifactNotFound(_))),
                "`{name}` resolved outside the artifacts directory"
            );
        }

        assert!(store.resolve("Lock.sol:Lock").is_ok());
    }

    #[test]
    fn test_resolve_ambiguous_name() {
        let err = fixtures("artifacts").resolve("Ownable").unwrap_err();
        assert!(err.to_string().contains("fully qualified"));
    }

    #[test]
    fn test_resolve_unknown_name() {
        assert!(matches!(
            fixtures("artifacts").resolve("DoesNotExist"),
            Err(ScriptError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_missing_root() {
        assert!(matches!(
            fixtures("no-such-dir").resolve("Lock"),
            Err(ScriptError::ArtifactNotFound(_))
        ));
    }

    #[test]
    fn test_interface_has_no_bytecode() {
        let err = fixtures("artifacts").resolve("IRES").unwrap_err();
        assert!(err.to_string().contains("no creation bytecode"));
    }

    #[test]
    fn test_unlinked_library_rejected() {
        let contents = r#"{
            "abi": [],
            "bytecode": "0x6080__$f1e4a1c7c8c1b2e45ca4e33f1bb0e9d2a3$__6040"
        }"#;

        let err = parse_artifact("Linked", contents).unwrap_err();
        assert!(err.to_string().contains("unlinked libraries"));
    }

    #[test]
    fn test_malformed_artifact() {
        assert!(matches!(
            parse_artifact("Broken", r#"{ "abi": [] }"#),
            Err(ScriptError::ArtifactParsing(_))
        ));
    }
}
