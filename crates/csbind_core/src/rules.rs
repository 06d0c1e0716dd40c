//! Rules and the contracts guarding each public operation.

use crate::config::ObservableConfig;
use crate::contract::{Contract, Rule};
use csbind_codec::Value;
use csbind_protocol::{Mode, MutationRequest};

fn joined(modes: &[Mode]) -> String {
    modes.iter().map(Mode::as_str).collect::<Vec<_>>().join(",")
}

/// Passes for non-empty text.
pub fn non_empty_text(message: impl Into<String>) -> Rule<str> {
    Rule::new(message, |s: &str| !s.is_empty())
}

/// Passes when every element is non-empty text.
pub fn all_non_empty(message: impl Into<String>) -> Rule<[String]> {
    Rule::new(message, |items: &[String]| items.iter().all(|s| !s.is_empty()))
}

/// Passes when every element is a record carrying all of `keys`.
pub fn records_with_keys(keys: &[String], message: impl Into<String>) -> Rule<[Value]> {
    let keys = keys.to_vec();
    Rule::new(message, move |values: &[Value]| {
        values.iter().all(|v| v.has_keys(&keys))
    })
}

/// Passes when the request names one of `modes` and carries that mode's
/// required properties.
pub fn mode_fields_present(modes: &[Mode]) -> Rule<MutationRequest> {
    let needs = modes
        .iter()
        .map(|m| format!("{} needs {}", m, m.required_fields().join(",")))
        .collect::<Vec<_>>()
        .join("; ");
    let modes = modes.to_vec();
    Rule::new(
        format!("request must carry a mode and its properties ({needs})"),
        move |request: &MutationRequest| match request.mode() {
            Some(mode) if modes.contains(&mode) => mode
                .required_fields()
                .iter()
                .all(|field| request.has_field(field)),
            _ => false,
        },
    )
}

/// Passes when the request's mode is one of `modes`.
pub fn mode_in(modes: &[Mode]) -> Rule<MutationRequest> {
    let message = format!("request mode must be one of {}", joined(modes));
    let modes = modes.to_vec();
    Rule::new(message, move |request: &MutationRequest| {
        request.mode().is_some_and(|mode| modes.contains(&mode))
    })
}

/// Passes when an indexed request's index lies in `0..=len`.
///
/// The upper bound is inclusive for every indexed mode, so `edit` and
/// `remove` at `len` pass this rule and reach the authority.
pub fn index_in_range(len: usize) -> Rule<MutationRequest> {
    let upper = i64::try_from(len).unwrap_or(i64::MAX);
    Rule::new(
        format!("request index must be an integer between 0 and {len} for indexed modes"),
        move |request: &MutationRequest| match request.mode() {
            Some(mode) if mode.is_indexed() => request
                .index()
                .is_some_and(|index| (0..=upper).contains(&index)),
            _ => true,
        },
    )
}

/// Passes when a record-carrying request's values are records with `keys`.
pub fn values_are_records(keys: &[String]) -> Rule<MutationRequest> {
    let message = format!(
        "request values must be records carrying keys {}",
        keys.join(",")
    );
    let keys = keys.to_vec();
    Rule::new(message, move |request: &MutationRequest| match request.mode() {
        Some(mode) if mode.carries_records() => request
            .values()
            .is_some_and(|values| values.iter().all(|v| v.has_keys(&keys))),
        _ => true,
    })
}

/// Contract for constructing an observable.
pub fn construct_contract() -> Contract<ObservableConfig> {
    Contract::new()
        .argument(
            |config: &ObservableConfig| config.name.as_str(),
            vec![non_empty_text("name must be a non-empty string")],
        )
        .argument(
            |config: &ObservableConfig| config.required_keys.as_slice(),
            vec![all_non_empty("required keys must be non-empty strings")],
        )
}

/// Contract for seeding an observable.
pub fn start_contract(required_keys: &[String]) -> Contract<[Value]> {
    let message = format!(
        "seed must contain only records carrying keys {}",
        required_keys.join(",")
    );
    Contract::new().argument(
        |seed: &[Value]| seed,
        vec![records_with_keys(required_keys, message)],
    )
}

/// Contract for a mutation request against a snapshot of `len` records.
pub fn request_contract(
    len: usize,
    modes: &[Mode],
    required_keys: &[String],
) -> Contract<MutationRequest> {
    Contract::new().argument(
        |request: &MutationRequest| request,
        vec![
            mode_fields_present(modes),
            index_in_range(len),
            mode_in(modes),
            values_are_records(required_keys),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use csbind_protocol::{FIELD_INDEX, FIELD_MODE, FIELD_VALUES, INBOUND_MODES, LOCAL_MODES};
    use proptest::prelude::*;

    fn keys() -> Vec<String> {
        vec!["content".to_string(), "author".to_string()]
    }

    fn rec(content: &str) -> Value {
        Value::record([("content", content), ("author", "tester")])
    }

    #[test]
    fn name_rule() {
        let contract = construct_contract();
        assert!(contract.check(&ObservableConfig::new("chat")).is_ok());

        let err = contract.check(&ObservableConfig::new("")).unwrap_err();
        assert_eq!(err.violations(), &["name must be a non-empty string"]);
    }

    #[test]
    fn required_keys_rule() {
        let config = ObservableConfig::new("chat").with_required_keys(["content", ""]);
        let err = construct_contract().check(&config).unwrap_err();
        assert_eq!(err.violations(), &["required keys must be non-empty strings"]);
    }

    #[test]
    fn seed_records_need_required_keys() {
        let contract = start_contract(&keys());
        assert!(contract.check(&[rec("a"), rec("b")]).is_ok());
        assert!(contract.check(&[]).is_ok());
        assert!(contract
            .check(&[rec("a"), Value::record([("content", "b")])])
            .is_err());
        assert!(contract.check(&[Value::from("not a record")]).is_err());
    }

    #[test]
    fn well_formed_requests_pass() {
        let contract = request_contract(3, &LOCAL_MODES, &keys());
        assert!(contract.check(&MutationRequest::insert(1, vec![rec("x")])).is_ok());
        assert!(contract.check(&MutationRequest::edit(0, vec![rec("x")])).is_ok());
        assert!(contract.check(&MutationRequest::add(vec![rec("x")])).is_ok());
        assert!(contract.check(&MutationRequest::remove(2)).is_ok());
    }

    #[test]
    fn bogus_mode_cites_allowed_set() {
        let request = MutationRequest::new()
            .with_field(FIELD_MODE, "bogus")
            .with_field(FIELD_INDEX, 0)
            .with_field(FIELD_VALUES, vec![rec("x")]);
        let err = request_contract(3, &LOCAL_MODES, &keys())
            .check(&request)
            .unwrap_err();
        assert!(err
            .violations()
            .contains(&"request mode must be one of insert,edit,add,remove".to_string()));
    }

    #[test]
    fn check_is_inbound_only() {
        let request = MutationRequest::check(vec![]);
        assert!(request_contract(0, &LOCAL_MODES, &keys())
            .check(&request)
            .is_err());
        assert!(request_contract(0, &INBOUND_MODES, &keys())
            .check(&request)
            .is_ok());
    }

    #[test]
    fn missing_properties_fail() {
        let request = MutationRequest::new()
            .with_field(FIELD_MODE, "insert")
            .with_field(FIELD_VALUES, vec![rec("x")]);
        let err = request_contract(3, &LOCAL_MODES, &keys())
            .check(&request)
            .unwrap_err();
        assert_eq!(err.violations().len(), 2);
        assert!(err.violations()[0].starts_with("request must carry a mode"));
        assert!(err.violations()[1].starts_with("request index must be"));
    }

    #[test]
    fn non_integer_index_fails() {
        let request = MutationRequest::new()
            .with_field(FIELD_MODE, "remove")
            .with_field(FIELD_INDEX, "test");
        assert!(request_contract(3, &LOCAL_MODES, &keys())
            .check(&request)
            .is_err());
    }

    #[test]
    fn records_missing_keys_fail() {
        let request = MutationRequest::add(vec![rec("x"), Value::record([("author", "y")])]);
        let err = request_contract(3, &LOCAL_MODES, &keys())
            .check(&request)
            .unwrap_err();
        assert_eq!(
            err.violations(),
            &["request values must be records carrying keys content,author"]
        );
    }

    #[test]
    fn edit_and_remove_accept_len() {
        let contract = request_contract(3, &LOCAL_MODES, &keys());
        assert!(contract.check(&MutationRequest::remove(3)).is_ok());
        assert!(contract.check(&MutationRequest::edit(3, vec![rec("x")])).is_ok());
    }

    proptest! {
        #[test]
        fn insert_index_bound(len in 0usize..16, index in -4i64..24) {
            let contract = request_contract(len, &LOCAL_MODES, &keys());
            let accepted = contract
                .check(&MutationRequest::insert(index, vec![rec("x")]))
                .is_ok();
            prop_assert_eq!(accepted, index >= 0 && index <= len as i64);
        }
    }
}
