//! Behavioural tests for configuration precedence.

use std::cell::RefCell;
use std::ffi::OsString;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use devhost_config::{
    Config, ConfigError, default_bridge_level, default_log_filter, default_log_format,
};

struct Harness {
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Result<Config, ConfigError>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            cli_args: RefCell::new(vec![OsString::from("devhostd")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
        }
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` in edition 2024. Each scenario
        // touches a distinct variable and `Drop` restores it.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn config(&self) -> Config {
        if self.loaded.borrow().is_none() {
            let args = self.cli_args.borrow().clone();
            *self.loaded.borrow_mut() = Some(Config::load_from_iter(args));
        }
        match self.loaded.borrow().as_ref() {
            Some(Ok(config)) => config.clone(),
            Some(Err(error)) => panic!("configuration failed to load: {error}"),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        for (key, previous) in self.env_overrides.borrow_mut().drain(..).rev() {
            match previous {
                Some(value) => unsafe { std::env::set_var(&key, value) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("the environment sets {key} to \"{value}\"")]
fn given_environment(harness: &Harness, key: String, value: String) {
    harness.set_env(&key, &value);
}

#[when("the CLI sets {flag} to \"{value}\"")]
fn when_cli_flag(harness: &Harness, flag: String, value: String) {
    harness.push_cli_arg(flag);
    harness.push_cli_arg(value);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    let _ = harness.config();
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.config();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.bridge_level(), default_bridge_level());
    assert!(config.device_command().is_none());
}

#[then("loading the configuration resolves the poll interval to {millis} milliseconds")]
fn then_poll_interval(harness: &Harness, millis: u64) {
    let config = harness.config();
    assert_eq!(config.device_poll_interval_ms, millis);
}

#[then("loading the configuration resolves the launch command to \"{command}\"")]
fn then_launch_command(harness: &Harness, command: String) {
    let config = harness.config();
    let expected: Vec<String> = command.split_whitespace().map(str::to_owned).collect();
    assert_eq!(config.launch_command(), Some(expected));
}

#[scenario(path = "tests/features/configuration_precedence.feature")]
fn configuration_precedence(#[from(harness)] harness: Harness) {
    let _ = harness;
}
