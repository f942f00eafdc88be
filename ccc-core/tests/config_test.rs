use ccc_core::config::{read_json_file, write_json_file};
use ccc_core::gemini::{self, KeyWrite};
use ccc_core::mcp::JSON_SERVERS_KEY;
use ccc_core::registry::default_copy_keys;
use ccc_core::toml_lite;
use ccc_core::{
    AppType, ApplyOutcome, ClaudeSettings, ClearOutcome, ConfigPaths, ConfigStore, CoreError,
    EnvKind, Environment, McpSelector, Registry, Scope, ServerDefinition,
};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn global_paths(home: &TempDir) -> ConfigPaths {
    ConfigPaths::with_home(home.path(), Scope::Global)
}

#[test]
fn test_first_load_seeds_registry() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    let store = ConfigStore::new(&paths);

    let registry = store.load(None).expect("Failed to load registry");
    assert!(paths.registry_path().exists());
    assert_eq!(registry.environments.len(), 2);
    assert!(registry.mcp_servers.contains_key("context7"));
    assert!(registry.active_mcp_servers.is_empty());
    assert_eq!(registry.copy_keys, default_copy_keys());
}

#[test]
fn test_migration_runs_once() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    fs::create_dir_all(paths.config_dir()).unwrap();
    fs::write(
        paths.registry_path(),
        r#"{"environments":[{"name":"old","ANTHROPIC_API_KEY":"k","ANTHROPIC_MODEL":"m"}]}"#,
    )
    .unwrap();

    let store = ConfigStore::new(&paths);
    let registry = store.load(None).expect("Failed to load registry");
    let env = &registry.environments[0];
    assert_eq!(env.kind, EnvKind::Claude);
    assert_eq!(env.field_str("ANTHROPIC_SMALL_FAST_MODEL"), Some("m"));

    let after_first = fs::read(paths.registry_path()).unwrap();
    store.load(None).expect("Failed to reload registry");
    let after_second = fs::read(paths.registry_path()).unwrap();
    assert_eq!(after_first, after_second);
}

#[test]
fn test_corrupt_registry_is_reported() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    fs::create_dir_all(paths.config_dir()).unwrap();
    fs::write(paths.registry_path(), "{ not json").unwrap();

    let result = ConfigStore::new(&paths).load(None);
    assert!(matches!(result, Err(CoreError::ConfigCorrupt { .. })));
    assert_eq!(fs::read_to_string(paths.registry_path()).unwrap(), "{ not json");
}

#[test]
fn test_filtered_view_cannot_be_saved() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let store = ConfigStore::new(&global_paths(&home));

    let view = store.load(Some(&EnvKind::Gemini)).expect("Failed to load view");
    assert!(view.environments.iter().all(|e| e.kind == EnvKind::Gemini));
    assert!(matches!(store.try_save(&view), Err(CoreError::FilteredView)));
    assert!(!store.save(&view));

    let full = store.load(None).expect("Failed to load registry");
    assert_eq!(full.environments.len(), 2);
}

#[test]
fn test_switch_backs_up_once_and_clear_restores() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    let original = json!({"env": {"ANTHROPIC_BASE_URL": "https://orig", "KEEP": "1"}, "model": "opus"});
    write_json_file(&paths.claude_settings_path(), &original).unwrap();
    let copy_keys = default_copy_keys();

    let first = Environment::new("a", EnvKind::Claude)
        .with_field("ANTHROPIC_API_KEY", "sk-a")
        .with_field("ANTHROPIC_BASE_URL", "https://a");
    let second = Environment::new("b", EnvKind::Claude).with_field("ANTHROPIC_AUTH_TOKEN", "tok");

    let mut settings = ClaudeSettings::load(&paths).expect("Failed to load settings");
    settings.switch_to(&first, &copy_keys).unwrap();
    settings.save().unwrap();

    let mut settings = ClaudeSettings::load(&paths).expect("Failed to load settings");
    settings.switch_to(&second, &copy_keys).unwrap();
    settings.save().unwrap();

    let doc = read_json_file(&paths.claude_settings_path()).unwrap().unwrap();
    assert_eq!(doc["env_bak"], original["env"]);
    assert_eq!(doc["env"], json!({"KEEP": "1", "ANTHROPIC_AUTH_TOKEN": "tok"}));

    let mut settings = ClaudeSettings::load(&paths).expect("Failed to load settings");
    assert_eq!(settings.clear(&copy_keys).unwrap(), ClearOutcome::Restored);
    settings.save().unwrap();

    let doc = read_json_file(&paths.claude_settings_path()).unwrap().unwrap();
    assert_eq!(doc, original);
}

#[test]
fn test_global_settings_must_exist() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let result = ClaudeSettings::load(&global_paths(&home));
    assert!(matches!(result, Err(CoreError::SettingsMissing(_))));
}

#[test]
fn test_project_settings_are_created() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let project = TempDir::new().expect("Failed to create temp dir");
    let paths = ConfigPaths::with_home(home.path(), Scope::Project(project.path().to_path_buf()));

    let settings = ClaudeSettings::load(&paths).expect("Failed to load settings");
    assert_eq!(
        settings.path(),
        project.path().join(".claude").join("settings.json")
    );
    assert!(settings.path().exists());
    assert_eq!(settings.document()["permissions"], json!({"allow": [], "deny": []}));
}

fn registry_with_servers() -> Registry {
    let mut registry = Registry::default();
    registry.mcp_servers.insert(
        "context7".into(),
        ServerDefinition::stdio("npx", &["-y", "@upstash/context7-mcp"]),
    );
    registry.mcp_servers.insert(
        "github".into(),
        ServerDefinition::http("https://api.githubcopilot.com/mcp/")
            .with("bearer_token", "ghp")
            .with("oauth", true),
    );
    registry
}

#[test]
fn test_mcp_selection_reaches_every_target() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    write_json_file(&paths.claude_mcp_path(), &json!({"numStartups": 3})).unwrap();
    fs::create_dir_all(paths.codex_dir()).unwrap();
    fs::write(paths.codex_config_path(), "model = \"gpt-5\"\n").unwrap();

    let mut registry = registry_with_servers();
    registry.set_active_mcp_servers(["github", "context7"]);

    let results = McpSelector::new(&paths).apply_active(&registry);
    assert_eq!(results.len(), 3);
    for status in &results {
        assert_eq!(status.outcome, ApplyOutcome::Written { servers: 2 }, "{:?}", status.target);
    }

    let claude = read_json_file(&paths.claude_mcp_path()).unwrap().unwrap();
    assert_eq!(claude["numStartups"], 3);
    let names: Vec<&String> = claude[JSON_SERVERS_KEY].as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["github", "context7"]);

    let gemini = read_json_file(&paths.gemini_settings_path()).unwrap().unwrap();
    assert_eq!(gemini[JSON_SERVERS_KEY], claude[JSON_SERVERS_KEY]);

    let codex = toml_lite::read_file(&paths.codex_config_path()).unwrap();
    assert_eq!(codex["model"], "gpt-5");
    assert_eq!(codex["experimental_use_rmcp_client"], true);
    assert_eq!(codex["mcp_servers"]["context7"]["command"], "npx");
    assert_eq!(codex["mcp_servers"]["github"]["bearer_token"], "ghp");
}

#[test]
fn test_selection_replaces_stale_servers_and_keeps_unrelated_codex_keys() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    write_json_file(
        &paths.claude_mcp_path(),
        &json!({"numStartups": 3, "mcpServers": {"c": {"command": "old-c"}}}),
    )
    .unwrap();
    let codex_before = "model = \"gpt-5\"\ntools.web_search = true\n\n[profiles.fast]\nmodel = \"o4-mini\"\n\n[mcp_servers.c]\ncommand = \"old-c\"\n";
    fs::create_dir_all(paths.codex_dir()).unwrap();
    fs::write(paths.codex_config_path(), codex_before).unwrap();

    let mut registry = Registry::default();
    registry
        .mcp_servers
        .insert("a".into(), ServerDefinition::stdio("npx", &["-y", "a"]));
    registry.mcp_servers.insert(
        "b".into(),
        ServerDefinition::http("https://b.example/mcp").with("bearer_token", "tok"),
    );
    registry
        .mcp_servers
        .insert("c".into(), ServerDefinition::stdio("c-server", &[]));
    registry.set_active_mcp_servers(["a", "b"]);

    let results = McpSelector::new(&paths).apply_active(&registry);
    let targets: Vec<AppType> = results.iter().map(|s| s.target).collect();
    assert_eq!(targets, vec![AppType::Claude, AppType::Gemini, AppType::Codex]);
    assert!(results
        .iter()
        .all(|s| s.outcome == ApplyOutcome::Written { servers: 2 }));

    for path in [paths.claude_mcp_path(), paths.gemini_settings_path()] {
        let doc = read_json_file(&path).unwrap().unwrap();
        let names: Vec<&String> = doc[JSON_SERVERS_KEY].as_object().unwrap().keys().collect();
        assert_eq!(names, vec!["a", "b"], "{}", path.display());
    }
    let claude = read_json_file(&paths.claude_mcp_path()).unwrap().unwrap();
    assert_eq!(claude["numStartups"], 3);
    assert_eq!(claude[JSON_SERVERS_KEY]["a"]["command"], "npx");

    let content = fs::read_to_string(paths.codex_config_path()).unwrap();
    let mut codex: toml::Table = toml::from_str(&content).expect("Codex config is valid TOML");
    let servers: Vec<&String> = codex["mcp_servers"].as_table().unwrap().keys().collect();
    assert_eq!(servers, vec!["a", "b"]);
    assert_eq!(codex["mcp_servers"]["a"]["command"].as_str(), Some("npx"));
    assert_eq!(codex["tools"]["web_search"].as_bool(), Some(true));

    // Everything outside mcp_servers reads back exactly as before
    let mut before: toml::Table = toml::from_str(codex_before).unwrap();
    before.remove("mcp_servers");
    codex.remove("mcp_servers");
    assert_eq!(codex, before);
}

#[test]
fn test_empty_selection_clears_targets() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    let selector = McpSelector::new(&paths);

    let mut registry = registry_with_servers();
    registry.set_active_mcp_servers(["context7"]);
    selector.apply_active(&registry);

    registry.set_active_mcp_servers(Vec::<String>::new());
    let results = selector.apply_active(&registry);
    assert!(results.iter().all(|s| s.outcome == ApplyOutcome::Cleared));

    let claude = read_json_file(&paths.claude_mcp_path()).unwrap().unwrap();
    assert!(claude.get(JSON_SERVERS_KEY).is_none());
    let codex = toml_lite::read_file(&paths.codex_config_path()).unwrap();
    assert!(codex.get("mcp_servers").is_none());

    let results = selector.apply_active(&registry);
    assert!(results.iter().all(|s| s.outcome == ApplyOutcome::Unchanged));
}

#[test]
fn test_one_broken_target_does_not_block_others() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);
    fs::write(paths.claude_mcp_path(), "{ broken").unwrap();

    let mut registry = registry_with_servers();
    registry.set_active_mcp_servers(["context7"]);
    let results = McpSelector::new(&paths).apply_active(&registry);

    assert!(matches!(results[0].outcome, ApplyOutcome::Failed(_)));
    assert!(results[1].is_ok());
    assert!(results[2].is_ok());
    assert_eq!(fs::read_to_string(paths.claude_mcp_path()).unwrap(), "{ broken");

    let status = McpSelector::new(&paths).status();
    assert!(status[0].error.is_some());
    assert_eq!(status[1].servers, vec!["context7"]);
    assert_eq!(status[2].servers, vec!["context7"]);
}

#[test]
fn test_gemini_key_is_written_once() {
    let home = TempDir::new().expect("Failed to create temp dir");
    let paths = global_paths(&home);

    let env_path = paths.gemini_env_path();
    assert_eq!(gemini::write_api_key(&env_path, "first").unwrap(), KeyWrite::Created);
    assert_eq!(gemini::write_api_key(&env_path, "second").unwrap(), KeyWrite::Updated);
    assert_eq!(
        gemini::read_api_key(&env_path).unwrap().as_deref(),
        Some("second")
    );
    let content = fs::read_to_string(&env_path).unwrap();
    assert_eq!(content.matches("GEMINI_API_KEY").count(), 1);
}
