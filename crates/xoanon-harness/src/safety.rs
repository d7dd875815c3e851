//! Refuse to inject input into the operator's own display.
//!
//! A test suite takes over the keyboard, mouse, and display for extended
//! periods, which is mildly disastrous when the user is not expecting it.
//! `DISPLAY` values naming screen zero on an empty or `localhost` host are
//! treated as the operator's local session and refused; any other value is
//! assumed to be a nested or remote server (Xvfb and friends) and allowed.
//! When `DISPLAY` is unset nothing can be determined, so the local case is
//! assumed. Callers attaching the harness to a real display backend should
//! run [`check_current_display`] first; the headless scene itself seizes
//! nothing.

use std::collections::HashMap;
use std::sync::LazyLock;

use log::debug;
use regex_lite::Regex;
use xoanon_core::{Error, Result};

/// Environment variable that, when set to exactly `true`, permits running
/// on a local display anyway.
pub const OVERRIDE_VARIABLE: &str = "XOANON_REALLY_USE_LOCAL_DISPLAY";

static LOCAL_DISPLAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*):0(\.[0-9]+)?$").expect("display pattern"));

/// Decide whether injecting input is permitted given the environment.
pub fn is_display_permitted(env: &HashMap<String, String>) -> bool {
    let Some(display) = env.get("DISPLAY") else {
        debug!("cannot determine if the display is local; assuming that it is");
        return false;
    };
    debug!("DISPLAY environment variable: {display}");

    let Some(captures) = LOCAL_DISPLAY.captures(display) else {
        debug!("DISPLAY does not name screen zero; assuming a non-local display");
        return true;
    };
    let hostname = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    debug!("DISPLAY hostname: {hostname:?}");

    match hostname {
        "" | "localhost" => {
            debug!("display appears to be local");
            override_permitted(env)
        }
        _ => {
            debug!("non-localhost hostname; assuming a non-local display");
            true
        }
    }
}

fn override_permitted(env: &HashMap<String, String>) -> bool {
    env.get(OVERRIDE_VARIABLE).is_some_and(|v| v == "true")
}

/// Check the current process environment, failing with
/// [`Error::DisplayNotPermitted`] if input injection is not allowed.
pub fn check_current_display() -> Result<()> {
    check_display_permitted(&std::env::vars().collect())
}

pub fn check_display_permitted(env: &HashMap<String, String>) -> Result<()> {
    if is_display_permitted(env) {
        Ok(())
    } else {
        Err(Error::DisplayNotPermitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL: &[&str] = &[
        ":0",
        ":0.0",
        ":0.1",
        "localhost:0",
        "localhost:0.0",
        "localhost:0.1",
    ];

    const NON_LOCAL: &[&str] = &[
        ":1",
        ":1.0",
        ":1.1",
        "localhost:1",
        "localhost:1.0",
        "localhost:1.1",
        "example.com:0",
        "example.com:0.0",
        "example.com:0.1",
    ];

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn local_displays_are_refused() {
        for display in LOCAL {
            assert!(
                !is_display_permitted(&env(&[("DISPLAY", display)])),
                "{display}"
            );
        }
    }

    #[test]
    fn local_displays_are_refused_when_the_override_is_false() {
        for display in LOCAL {
            let env = env(&[("DISPLAY", display), (OVERRIDE_VARIABLE, "false")]);
            assert!(!is_display_permitted(&env), "{display}");
        }
    }

    #[test]
    fn local_displays_are_permitted_when_overridden() {
        for display in LOCAL {
            let env = env(&[("DISPLAY", display), (OVERRIDE_VARIABLE, "true")]);
            assert!(is_display_permitted(&env), "{display}");
        }
    }

    #[test]
    fn non_local_displays_are_permitted() {
        for display in NON_LOCAL {
            assert!(
                is_display_permitted(&env(&[("DISPLAY", display)])),
                "{display}"
            );
        }
    }

    #[test]
    fn unset_display_is_assumed_local() {
        assert!(!is_display_permitted(&env(&[])));
        assert!(matches!(
            check_display_permitted(&env(&[])),
            Err(Error::DisplayNotPermitted)
        ));
    }
}
