//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr};

use alloy::primitives::{utils::parse_units, Address, U256};
use serde::{Deserialize, Deserializer};
use serde_json::{value::RawValue, Map, Value};

use crate::{constants::DEPLOYMENTS_KEY, errors::ScriptError};

/// Parse a value amount.
///
/// Accepts an integer amount of wei, in decimal or `0x` hex, or a decimal
/// amount followed by a unit name: `1 gwei`, `0.5ether`.
pub fn parse_value(value: &str) -> Result<U256, ScriptError> {
    let value = value.trim();
    if value.starts_with('-') {
        return Err(ScriptError::CalldataConstruction(format!(
            "value cannot be negative: {value}"
        )));
    }

    let is_hex = value.starts_with("0x") || value.starts_with("0X");
    let unit_start = (!is_hex)
        .then(|| value.find(|c: char| c.is_ascii_alphabetic()))
        .flatten();

    match unit_start {
        None => U256::from_str(value)
            .map_err(|e| ScriptError::CalldataConstruction(format!("invalid value `{value}`: {e}"))),
        Some(i) => {
            let (amount, unit) = value.split_at(i);
            parse_units(amount.trim(), unit.trim())
                .map(|units| units.get_absolute())
                .map_err(|e| {
                    ScriptError::CalldataConstruction(format!("invalid value `{value}`: {e}"))
                })
        }
    }
}

/// Interpret a constructor argument given on the command line.
///
/// Anything that parses as JSON (numbers, booleans, arrays) is taken as
/// such; everything else is a plain string. Numbers keep their literal text,
/// see [`json_arg`].
pub fn parse_cli_arg(arg: &str) -> Value {
    serde_json::from_str::<Box<RawValue>>(arg)
        .and_then(|raw| json_arg(&raw))
        .unwrap_or_else(|_| Value::String(arg.to_string()))
}

/// Convert a raw JSON constructor argument into a [`Value`], keeping numbers
/// as their literal text.
///
/// `serde_json` stores numbers beyond `u64`/`i64` as `f64`, which would
/// silently round a `uint256`. The literal is coerced against the ABI type
/// instead.
pub fn json_arg(raw: &RawValue) -> Result<Value, serde_json::Error> {
    let text = raw.get().trim();
    match text.as_bytes().first() {
        Some(b'-' | b'0'..=b'9') => Ok(Value::String(text.to_string())),
        Some(b'[') => serde_json::from_str::<Vec<Box<RawValue>>>(text)?
            .iter()
            .map(|item| json_arg(item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        _ => serde_json::from_str(text),
    }
}

/// Deserialize a list of constructor arguments with [`json_arg`]
pub fn deserialize_json_args<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Box<RawValue>>::deserialize(deserializer)?
        .iter()
        .map(|raw| json_arg(raw).map_err(serde::de::Error::custom))
        .collect()
}

/// Read and parse a JSON file
pub fn get_json_from_file(file_path: &Path) -> Result<Value, ScriptError> {
    let contents = fs::read_to_string(file_path)
        .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", file_path.display(), e)))?;

    serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Read the address recorded under `contract_key` in the deployments file
pub fn parse_addr_from_deployments_file(
    file_path: &Path,
    contract_key: &str,
) -> Result<Address, ScriptError> {
    let parsed_json = get_json_from_file(file_path)?;

    let addr_str = parsed_json[DEPLOYMENTS_KEY][contract_key]
        .as_str()
        .ok_or_else(|| {
            ScriptError::ReadDeployments(format!(
                "no `{}` address in {}",
                contract_key,
                file_path.display()
            ))
        })?;

    Address::from_str(addr_str).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Record a deployed address in the deployments file, creating the file if
/// needed and leaving all other entries in place
pub fn write_deployed_address(
    file_path: &Path,
    contract_key: &str,
    address: Address,
) -> Result<(), ScriptError> {
    let mut parsed_json = if file_path.exists() {
        get_json_from_file(file_path)?
    } else {
        Value::Object(Map::new())
    };

    let deployments = parsed_json
        .as_object_mut()
        .ok_or_else(|| ScriptError::WriteDeployments("expected a JSON object".to_string()))?
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            ScriptError::WriteDeployments(format!("`{DEPLOYMENTS_KEY}` is not a JSON object"))
        })?;

    deployments.insert(contract_key.to_string(), Value::String(address.to_string()));

    let contents = serde_json::to_string_pretty(&parsed_json)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

    fs::write(file_path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use alloy::primitives::address;

    use super::*;

    /// A fresh path in the temp dir, removed on drop
    struct TempFile(PathBuf);

    impl TempFile {
        fn new(name: &str) -> Self {
            let path = std::env::temp_dir()
                .join(format!("deploy-scripts-{}-{}.json", std::process::id(), name));
            let _ = fs::remove_file(&path);
            Self(path)
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("1000000000").unwrap(), U256::from(1_000_000_000u64));
        assert_eq!(parse_value("0x3b9aca00").unwrap(), U256::from(1_000_000_000u64));
        assert_eq!(parse_value("1 gwei").unwrap(), U256::from(1_000_000_000u64));
        assert_eq!(parse_value("1gwei").unwrap(), U256::from(1_000_000_000u64));
        assert_eq!(
            parse_value("0.5 ether").unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
    }

    #[test]
    fn test_parse_invalid_value() {
        assert!(parse_value("-1").is_err());
        assert!(parse_value("1 parsec").is_err());
        assert!(parse_value("one").is_err());
    }

    #[test]
    fn test_parse_cli_arg() {
        assert_eq!(parse_cli_arg("RES NFT"), Value::from("RES NFT"));
        assert_eq!(parse_cli_arg("60"), Value::from("60"));
        assert_eq!(parse_cli_arg("true"), Value::from(true));
        assert_eq!(parse_cli_arg("${now+60}"), Value::from("${now+60}"));
        assert_eq!(parse_cli_arg("[1, [2]]"), serde_json::json!(["1", ["2"]]));
    }

    #[test]
    fn test_parse_cli_arg_keeps_number_literals() {
        assert_eq!(
            parse_cli_arg("123456789012345678901"),
            Value::from("123456789012345678901")
        );
        assert_eq!(parse_cli_arg("1e3"), Value::from("1e3"));
        assert_eq!(parse_cli_arg("-7"), Value::from("-7"));
        assert_eq!(parse_cli_arg("\"1e3\""), Value::from("1e3"));
    }

    #[test]
    fn test_json_args_keep_number_literals() {
        #[derive(Deserialize)]
        struct Args {
            #[serde(deserialize_with = "deserialize_json_args")]
            args: Vec<Value>,
        }

        let parsed: Args = serde_json::from_str(
            r#"{ "args": [115792089237316195423570985008687907853269984665640564039457584007913129639935, 1e3, "x", true, [18446744073709551616]] }"#,
        )
        .unwrap();

        assert_eq!(
            parsed.args,
            vec![
                Value::from(
                    "115792089237316195423570985008687907853269984665640564039457584007913129639935"
                ),
                Value::from("1e3"),
                Value::from("x"),
                Value::from(true),
                serde_json::json!(["18446744073709551616"]),
            ]
        );
    }

    #[test]
    fn test_deployments_round_trip() {
        let file = TempFile::new("round-trip");
        let res = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let lock = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

        write_deployed_address(&file.0, "res", res).unwrap();
        write_deployed_address(&file.0, "lock", lock).unwrap();

        assert_eq!(parse_addr_from_deployments_file(&file.0, "res").unwrap(), res);
        assert_eq!(parse_addr_from_deployments_file(&file.0, "lock").unwrap(), lock);
    }

    #[test]
    fn test_write_preserves_other_keys() {
        let file = TempFile::new("preserve");
        fs::write(&file.0, r#"{ "network": "devnet", "deployments": { "a": "0x01" } }"#).unwrap();

        write_deployed_address(&file.0, "b", Address::repeat_byte(0x11)).unwrap();

        let json = get_json_from_file(&file.0).unwrap();
        assert_eq!(json["network"], "devnet");
        assert_eq!(json[DEPLOYMENTS_KEY]["a"], "0x01");
        assert!(json[DEPLOYMENTS_KEY]["b"].is_string());
    }

    #[test]
    fn test_missing_deployment_key() {
        let file = TempFile::new("missing-key");
        write_deployed_address(&file.0, "res", Address::repeat_byte(0x22)).unwrap();

        assert!(matches!(
            parse_addr_from_deployments_file(&file.0, "marketplace"),
            Err(ScriptError::ReadDeployments(_))
        ));
    }
}
