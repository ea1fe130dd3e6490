//! Behaviour tests for configuration layering.

use std::cell::RefCell;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use evidence_config::{
    Config, DEFAULT_DRAIN_CHUNK_BYTES, DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_HEADER_BYTES,
    default_log_filter, default_log_format,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    // Held for the whole scenario so environment edits never interleave.
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Self {
            cli_args: RefCell::new(vec![OsString::from("evidence-provider")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _guard: guard,
        }
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` under edition 2024; the mutex above
        // serialises access and `Drop` restores the previous value.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => {
                *self.loaded.borrow_mut() = Some(config);
            }
            Err(error) => {
                *self.error.borrow_mut() = Some(error.to_string());
            }
        }
    }

    fn loaded_config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            if let Some(os_value) = value {
                unsafe { std::env::set_var(&key, os_value) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("the environment sets EVIDENCE_PROVIDER_MAX_BODY_BYTES to \"{value}\"")]
fn given_environment_body_ceiling(harness: &Harness, value: String) {
    harness.set_env("EVIDENCE_PROVIDER_MAX_BODY_BYTES", &value);
}

#[when("the CLI sets the body ceiling to \"{value}\"")]
fn when_cli_body_ceiling(harness: &Harness, value: String) {
    harness.push_cli_arg("--max-body-bytes");
    harness.push_cli_arg(value);
}

#[when("the CLI sets the header ceiling to \"{value}\"")]
fn when_cli_header_ceiling(harness: &Harness, value: String) {
    harness.push_cli_arg("--max-header-bytes");
    harness.push_cli_arg(value);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.loaded_config();

    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.max_header_bytes, DEFAULT_MAX_HEADER_BYTES);
    assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    assert_eq!(config.drain_chunk_bytes, DEFAULT_DRAIN_CHUNK_BYTES);
}

#[then("loading the configuration resolves the body ceiling to \"{value}\"")]
fn then_resolved_body_ceiling(harness: &Harness, value: String) {
    let config = harness.loaded_config();
    let expected: usize = match value.parse() {
        Ok(parsed) => parsed,
        Err(error) => panic!("invalid expected ceiling '{value}': {error}"),
    };

    assert_eq!(config.max_body_bytes, expected);
}

#[then("loading the configuration fails mentioning \"{text}\"")]
fn then_load_fails(harness: &Harness, text: String) {
    harness.load();

    let error = harness.error.borrow();
    let Some(message) = error.as_ref() else {
        panic!("configuration unexpectedly loaded");
    };
    assert!(
        message.contains(&text),
        "expected error mentioning '{text}', got: {message}"
    );
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Built-in defaults apply when nothing is overridden"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The environment overrides the body ceiling"
)]
fn environment_overrides_body_ceiling(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The CLI overrides the environment"
)]
fn cli_overrides_environment(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "A zero header ceiling is rejected"
)]
fn zero_header_ceiling_rejected(#[from(harness)] harness: Harness) {
    let _ = harness;
}
