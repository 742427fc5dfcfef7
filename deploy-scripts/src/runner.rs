//! The deployment runner: turns a [`ContractSpec`] into a confirmed
//! deployment.
//!
//! Everything that can be checked locally (artifact resolution, constructor
//! encoding, value overrides) is checked before the client sees a
//! transaction, so a malformed spec never reaches the chain.

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::StateMutability,
    primitives::U256,
};
use serde_json::Value;
use tracing::info;

use crate::{
    artifacts::{ArtifactStore, ContractArtifact},
    client::ChainClient,
    errors::ScriptError,
    types::{ContractSpec, DeployOverrides, DeploymentResult, DeploymentTx},
    utils::parse_value,
};

/// Deploy the contract described by `spec` and return its address
pub async fn deploy_contract(
    client: &impl ChainClient,
    artifacts: &ArtifactStore,
    spec: &ContractSpec,
) -> Result<DeploymentResult, ScriptError> {
    let artifact = artifacts.resolve(&spec.name)?;
    let tx = build_deployment_tx(&artifact, &spec.args, &spec.overrides)?;

    info!(
        "deploying `{}` from {} ({} bytes of init code, value {})",
        artifact.name,
        client.deployer(),
        tx.init_code.len(),
        tx.value
    );

    let result = client.deploy(tx).await?;

    info!(
        "`{}` confirmed in tx {} (block {:?}, {} gas)",
        artifact.name, result.tx_hash, result.block_number, result.gas_used
    );

    Ok(result)
}

/// Build the creation transaction for `artifact`
pub fn build_deployment_tx(
    artifact: &ContractArtifact,
    args: &[Value],
    overrides: &DeployOverrides,
) -> Result<DeploymentTx, ScriptError> {
    let encoded_args = encode_constructor_args(artifact, args)?;

    let value = match &overrides.value {
        Some(value) => parse_value(value)?,
        None => U256::ZERO,
    };

    let payable = artifact
        .abi
        .constructor()
        .is_some_and(|c| c.state_mutability == StateMutability::Payable);
    if !value.is_zero() && !payable {
        return Err(ScriptError::CalldataConstruction(format!(
            "`{}` constructor is not payable, cannot attach value {}",
            artifact.name, value
        )));
    }

    let init_code = [artifact.bytecode.as_ref(), encoded_args.as_slice()].concat();

    Ok(DeploymentTx {
        init_code: init_code.into(),
        value,
        gas_limit: overrides.gas_limit,
    })
}

/// ABI-encode the constructor arguments for `artifact`
pub fn encode_constructor_args(
    artifact: &ContractArtifact,
    args: &[Value],
) -> Result<Vec<u8>, ScriptError> {
    let Some(constructor) = artifact.abi.constructor() else {
        if args.is_empty() {
            return Ok(Vec::new());
        }

        return Err(ScriptError::CalldataConstruction(format!(
            "`{}` has no constructor, got {} argument(s)",
            artifact.name,
            args.len()
        )));
    };

    if constructor.inputs.len() != args.len() {
        return Err(ScriptError::CalldataConstruction(format!(
            "`{}` constructor expects {} argument(s), got {}",
            artifact.name,
            constructor.inputs.len(),
            args.len()
        )));
    }

    let values = constructor
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

            coerce_json(&ty, arg).map_err(|e| {
                ScriptError::CalldataConstruction(format!("argument `{}`: {}", param.name, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    constructor
        .abi_encode_input(&values)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
}

/// Coerce a JSON value into a value of the given Solidity type
fn coerce_json(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| coerce_json(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {} elements, got {}", len, items.len()));
            }

            items
                .iter()
                .map(|item| coerce_json(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!("expected {} fields, got {}", types.len(), items.len()));
            }

            types
                .iter()
                .zip(items)
                .map(|(ty, item)| coerce_json(ty, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|e| e.to_string()),
        (_, other) => Err(format!("cannot encode {} as {}", other, ty.sol_type_name())),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use alloy::{primitives::Address, sol_types::SolValue};
    use serde_json::json;

    use super::*;

    fn artifact(name: &str) -> ContractArtifact {
        ArtifactStore::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/artifacts"))
            .resolve(name)
            .unwrap()
    }

    #[test]
    fn test_encode_string_args() {
        let token = artifact("RES_TOKEN");
        let encoded = encode_constructor_args(&token, &[json!("RES NFT"), json!("RES")]).unwrap();

        let expected = ("RES NFT".to_string(), "RES".to_string()).abi_encode_params();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_init_code_appends_args() {
        let token = artifact("RES_TOKEN");
        let tx = build_deployment_tx(
            &token,
            &[json!("RES Token"), json!("RESTK")],
            &DeployOverrides::default(),
        )
        .unwrap();

        assert!(tx.init_code.starts_with(&token.bytecode));
        assert!(tx.init_code.len() > token.bytecode.len());
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.gas_limit, None);
    }

    #[test]
    fn test_no_constructor() {
        let marketplace = artifact("RES_Marketplace");

        let tx = build_deployment_tx(&marketplace, &[], &DeployOverrides::default()).unwrap();
        assert_eq!(tx.init_code, marketplace.bytecode);

        assert!(encode_constructor_args(&marketplace, &[json!(1)]).is_err());
    }

    #[test]
    fn test_wrong_arity() {
        let token = artifact("RES_TOKEN");

        let err = encode_constructor_args(&token, &[json!("RES NFT")]).unwrap_err();
        assert!(err.to_string().contains("expects 2 argument(s), got 1"));
    }

    #[test]
    fn test_wrong_type() {
        let lock = artifact("Lock");

        assert!(encode_constructor_args(&lock, &[json!("not a number")]).is_err());
        assert!(encode_constructor_args(&lock, &[json!(null)]).is_err());
        assert!(encode_constructor_args(&lock, &[json!([1, 2])]).is_err());
    }

    #[test]
    fn test_numeric_arg() {
        let lock = artifact("Lock");

        let from_number = encode_constructor_args(&lock, &[json!(1700000060u64)]).unwrap();
        let from_string = encode_constructor_args(&lock, &[json!("1700000060")]).unwrap();

        assert_eq!(from_number, U256::from(1_700_000_060u64).abi_encode());
        assert_eq!(from_number, from_string);
    }

    #[test]
    fn test_composite_args() {
        let ty = DynSolType::Tuple(vec![
            DynSolType::Array(Box::new(DynSolType::Address)),
            DynSolType::FixedArray(Box::new(DynSolType::Bool), 2),
        ]);
        let value = json!([[format!("{}", Address::repeat_byte(0x11))], [true, false]]);

        let coerced = coerce_json(&ty, &value).unwrap();
        assert_eq!(
            coerced,
            DynSolValue::Tuple(vec![
                DynSolValue::Array(vec![DynSolValue::Address(Address::repeat_byte(0x11))]),
                DynSolValue::FixedArray(vec![
                    DynSolValue::Bool(true),
                    DynSolValue::Bool(false)
                ]),
            ])
        );

        let short = json!([[], [true]]);
        assert!(coerce_json(&ty, &short).is_err());
    }

    #[test]
    fn test_payable_value() {
        let lock = artifact("Lock");
        let overrides = DeployOverrides {
            value: Some("1 gwei".to_string()),
            gas_limit: Some(500_000),
        };

        let tx = build_deployment_tx(&lock, &[json!(1700000060u64)], &overrides).unwrap();
        assert_eq!(tx.value, U256::from(1_000_000_000u64));
        assert_eq!(tx.gas_limit, Some(500_000));
    }

    #[test]
    fn test_value_on_non_payable_constructor() {
        let token = artifact("RES_TOKEN");
        let overrides = DeployOverrides {
            value: Some("1".to_string()),
            gas_limit: None,
        };

        let err =
            build_deployment_tx(&token, &[json!("RES NFT"), json!("RES")], &overrides).unwrap_err();
        assert!(err.to_string().contains("not payable"));
    }
}
