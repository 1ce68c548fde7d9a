//! Tests for template expansion with special characters and edge cases
//!
//! These tests target potential shell injection vulnerabilities and
//! edge cases in template variable substitution.

use super::expand_template;
use std::collections::HashMap;

#[test]
fn test_expand_template_normal() {
    let extras = HashMap::new();
    let result = expand_template(
        "echo {{ branch }} {{ main_worktree }}",
        "myrepo",
        "feature",
        &extras,
    )
    .unwrap();
    assert_eq!(result, "echo feature myrepo");
}

#[test]
fn test_expand_template_branch_with_slashes() {
    let extras = HashMap::new();
    let result = expand_template(
        "echo {{ branch }}",
        "myrepo",
        "feature/nested/branch",
        &extras,
    )
    .unwrap();

    assert_eq!(result, "echo feature-nested-branch");
}

// Tests with platform-specific shell escaping (Unix uses single quotes, Windows uses double quotes)
#[test]
#[cfg(unix)]
fn test_expand_template_branch_with_spaces() {
    // Branch names with spaces are shell-escaped
    let extras = HashMap::new();
    let result = expand_template("echo {{ branch }}", "myrepo", "feature name", &extras).unwrap();

    // Shell-escaped with single quotes
    assert_eq!(result, "echo 'feature name'");
}

#[test]
#[cfg(unix)]
fn test_expand_template_branch_with_special_shell_chars() {
    // Special shell characters are escaped
    let extras = HashMap::new();
    let result =
        expand_template("echo {{ branch }}", "myrepo", "feature$(whoami)", &extras).unwrap();

    // Shell-escaped, prevents command substitution
    assert_eq!(result, "echo 'feature$(whoami)'");
    // Shell executes: echo 'feature$(whoami)' (literal string, no command execution)
}

#[test]
#[cfg(unix)]
fn test_expand_template_branch_with_backticks() {
    // Backticks are escaped
    let extras = HashMap::new();
    let result = expand_template("echo {{ branch }}", "myrepo", "feature`id`", &extras).unwrap();

    assert_eq!(result, "echo 'feature`id`'");
}

#[test]
#[cfg(unix)]
fn test_expand_template_branch_with_quotes() {
    // Quotes are shell-escaped to prevent injection
    let extras = HashMap::new();
    let result = expand_template("echo '{{ branch }}'", "myrepo", "feature'test", &extras).unwrap();

    // Shell escapes single quotes as '\''
    assert_eq!(result, "echo ''feature'\\''test''");
}

#[test]
#[cfg(unix)]
fn test_expand_template_extra_vars_with_spaces() {
    // Extra variables with spaces are shell-escaped
    let mut extras = HashMap::new();
    extras.insert("worktree", "/path with spaces/to/worktree");
    let result = expand_template("cd {{ worktree }}", "myrepo", "main", &extras).unwrap();

    assert_eq!(result, "cd '/path with spaces/to/worktree'");
}

#[test]
#[cfg(unix)]
fn test_expand_template_extra_vars_with_dollar_sign() {
    // Dollar signs are shell-escaped to prevent variable expansion
    let mut extras = HashMap::new();
    extras.insert("worktree", "/path/$USER/worktree");
    let result = expand_template("cd {{ worktree }}", "myrepo", "main", &extras).unwrap();

    assert_eq!(result, "cd '/path/$USER/worktree'");
    // Shell-escaped, prevents $USER from being expanded
}

#[test]
#[cfg(unix)]
fn test_expand_template_extra_vars_with_command_substitution() {
    // Special shell characters are shell-escaped to prevent injection
    let mut extras = HashMap::new();
    extras.insert("target", "main; rm -rf /");
    let result = expand_template("git merge {{ target }}", "myrepo", "feature", &extras).unwrap();

    assert_eq!(result, "git merge 'main; rm -rf /'");
    // Shell-escaped, prevents semicolon from being executed as command separator
}

#[test]
fn test_expand_template_variable_collision() {
    // What if extra vars contain "branch"? With minijinja, extra vars added later override built-ins
    let mut extras = HashMap::new();
    extras.insert("branch", "hacked");
    let result = expand_template("echo {{ branch }}", "myrepo", "feature", &extras).unwrap();

    // Extra vars are added to context after built-ins, so they override
    assert_eq!(result, "echo hacked");
}

#[test]
fn test_expand_template_extra_var_named_branch() {
    // What if we have both {{ branch }} in template and "branch" in extras?
    let mut extras = HashMap::new();
    extras.insert("branch", "extra-branch");
    let result = expand_template(
        "echo {{ branch }} from {{ branch }}",
        "myrepo",
        "main",
        &extras,
    )
    .unwrap();

    // Extra vars override built-ins, so both occurrences use "extra-branch"
    assert_eq!(result, "echo extra-branch from extra-branch");
}

#[test]
fn test_expand_template_missing_variable() {
    // What happens with undefined variables?
    let extras = HashMap::new();
    let result = expand_template("echo {{ undefined }}", "myrepo", "main", &extras).unwrap();

    // minijinja will render undefined variables as empty string
    assert_eq!(result, "echo ");
}

#[test]
#[cfg(unix)]
fn test_expand_template_empty_branch() {
    let extras = HashMap::new();
    let result = expand_template("echo {{ branch }}", "myrepo", "", &extras).unwrap();

    // Empty string is shell-escaped to ''
    assert_eq!(result, "echo ''");
}

#[test]
#[cfg(unix)]
fn test_expand_template_unicode_in_branch() {
    // Unicode characters in branch name are shell-escaped
    let extras = HashMap::new();
    let result = expand_template("echo {{ branch }}", "myrepo", "feature-🚀", &extras).unwrap();

    // Unicode is preserved but quoted for shell safety
    assert_eq!(result, "echo 'feature-🚀'");
}

#[test]
fn test_expand_template_backslash_in_branch() {
    // Windows-style path separators
    let extras = HashMap::new();
    let result =
        expand_template("echo {{ branch }}", "myrepo", "feature\\branch", &extras).unwrap();

    assert_eq!(result, "echo feature-branch");
}

#[test]
fn test_expand_template_multiple_replacements() {
    let mut extras = HashMap::new();
    extras.insert("worktree", "/path/to/wt");
    extras.insert("target", "develop");

    let result = expand_template(
        "cd {{ worktree }} && git merge {{ target }} from {{ branch }}",
        "myrepo",
        "feature",
        &extras,
    )
    .unwrap();

    assert_eq!(result, "cd /path/to/wt && git merge develop from feature");
}

#[test]
fn test_expand_template_curly_braces_without_variables() {
    // Just curly braces, not variables
    let extras = HashMap::new();
    let result = expand_template("echo {}", "myrepo", "main", &extras).unwrap();

    assert_eq!(result, "echo {}");
}

#[test]
fn test_expand_template_nested_curly_braces() {
    // Nested braces - minijinja doesn't support {{{ syntax, use literal curly braces instead
    let extras = HashMap::new();
    let result =
        expand_template("echo {{ '{' ~ branch ~ '}' }}", "myrepo", "main", &extras).unwrap();

    // Renders as {main}
    assert_eq!(result, "echo {main}");
}

// These verify shell-escaping behavior for security-critical cases by
// comparing against the same `shell_escape::escape` call the expansion
// function itself uses, rather than hardcoding the escaped form inline.
//
// Unix-only: shell escaping is platform-dependent (Unix uses single quotes,
// Windows uses double quotes).

fn unix_escape(value: &str) -> String {
    shell_escape::escape(std::borrow::Cow::Borrowed(value)).to_string()
}

#[rstest::rstest]
#[case::spaces("feature name")]
#[case::dollar("feature$USER")]
#[case::command_sub("feature$(whoami)")]
#[case::backticks("feature`id`")]
#[case::semicolon("feature;rm -rf /")]
#[case::pipe("feature|grep foo")]
#[case::ampersand("feature&background")]
#[case::redirect("feature>output.txt")]
#[case::wildcard("feature*glob")]
#[case::question("feature?char")]
#[case::brackets("feature[0-9]")]
#[cfg(unix)]
fn shell_escaping_handles_special_chars(#[case] branch: &str) {
    let extras = HashMap::new();
    let result = expand_template("echo {{ branch }}", "myrepo", branch, &extras).unwrap();
    assert_eq!(result, format!("echo {}", unix_escape(branch)));
}

#[rstest::rstest]
#[case::single_quote("feature'test")]
#[case::double_quote("feature\"test")]
#[case::mixed_quotes("feature'test\"mixed")]
#[case::multiple_single("don't'panic")]
#[cfg(unix)]
fn shell_escaping_handles_quotes(#[case] branch: &str) {
    let extras = HashMap::new();
    let result = expand_template("echo {{ branch }}", "myrepo", branch, &extras).unwrap();
    assert_eq!(result, format!("echo {}", unix_escape(branch)));
}

#[rstest::rstest]
#[case::spaces("/path with spaces/to/worktree")]
#[case::dollar("/path/$USER/worktree")]
#[case::tilde("~/worktree")]
#[case::special_chars("/path/to/worktree (new)")]
#[case::unicode("/path/to/🚀/worktree")]
#[cfg(unix)]
fn shell_escaping_handles_paths(#[case] path: &str) {
    let mut extras = HashMap::new();
    extras.insert("worktree", path);
    let result = expand_template(
        "cd {{ worktree }} && echo {{ branch }}",
        "myrepo",
        "main",
        &extras,
    )
    .unwrap();
    assert_eq!(result, format!("cd {} && echo main", unix_escape(path)));
}

#[test]
#[cfg(unix)]
fn complex_templates_escape_every_substitution() {
    let mut extras = HashMap::new();
    extras.insert("worktree", "/path with spaces/wt");
    extras.insert("target", "main; rm -rf /");

    let cd_and_merge = expand_template(
        "cd {{ worktree }} && git merge {{ target }}",
        "/repo/path",
        "feature branch",
        &extras,
    )
    .unwrap();
    assert_eq!(
        cd_and_merge,
        format!(
            "cd {} && git merge {}",
            unix_escape("/path with spaces/wt"),
            unix_escape("main; rm -rf /")
        )
    );

    let npm_install = expand_template(
        "cd {{ main_worktree }}/{{ branch }} && npm install",
        "/repo/path",
        "feature/new-ui",
        &extras,
    )
    .unwrap();
    assert_eq!(
        npm_install,
        format!("cd {}/{} && npm install", unix_escape("/repo/path"), unix_escape("feature-new-ui"))
    );

    let echo_vars = expand_template(
        "echo 'Branch: {{ branch }}' 'Worktree: {{ worktree }}'",
        "/repo/path",
        "test$injection",
        &extras,
    )
    .unwrap();
    assert_eq!(
        echo_vars,
        format!(
            "echo 'Branch: {}' 'Worktree: {}'",
            unix_escape("test$injection"),
            unix_escape("/path with spaces/wt")
        )
    );
}
