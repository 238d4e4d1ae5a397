// tests/config_load.rs
use chat_moderator::config::{spawn_hot_reload, ENV_CONFIG_PATH, ENV_TRIGGER_ON};
use chat_moderator::{ModerationConfig, Moderator};
use serial_test::serial;
use std::{env, fs};

const BASE: &str = r#"
[service]
bot_user_id = 77

[profanity]
trigger_on = 2.0

[[profanity.lexicon]]
word = "spam"
weight = 2.0
"#;

/// Snapshot & restore env vars around a test.
struct EnvSnapshot {
    saved: Vec<(String, Option<String>)>,
}

impl EnvSnapshot {
    fn set(pairs: &[(&str, Option<&str>)]) -> Self {
        let mut saved = Vec::with_capacity(pairs.len());
        for (k, v) in pairs {
            saved.push((k.to_string(), env::var(k).ok()));
            match v {
                Some(val) => env::set_var(k, val),
                None => env::remove_var(k),
            }
        }
        Self { saved }
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (k, v) in self.saved.drain(..) {
            match v {
                Some(v) => env::set_var(&k, v),
                None => env::remove_var(&k),
            }
        }
    }
}

#[serial]
#[test]
fn env_path_and_trigger_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moderation.toml");
    fs::write(&path, BASE).unwrap();
    let path_str = path.to_string_lossy().to_string();

    let _env = EnvSnapshot::set(&[(ENV_CONFIG_PATH, Some(path_str.as_str())), (ENV_TRIGGER_ON, None)]);
    let cfg = ModerationConfig::from_toml().unwrap();
    assert_eq!(cfg.service.bot_user_id, 77);
    assert_eq!(cfg.profanity.trigger_on, 2.0);

    env::set_var(ENV_TRIGGER_ON, "3.5");
    assert_eq!(ModerationConfig::from_toml().unwrap().profanity.trigger_on, 3.5);

    // garbage override is ignored
    env::set_var(ENV_TRIGGER_ON, "lots");
    assert_eq!(ModerationConfig::from_toml().unwrap().profanity.trigger_on, 2.0);
}

#[serial]
#[test]
fn default_path_is_relative_to_cwd() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    let _env = EnvSnapshot::set(&[(ENV_CONFIG_PATH, None), (ENV_TRIGGER_ON, None)]);

    let err = ModerationConfig::from_toml().unwrap_err();
    assert!(format!("{err:#}").contains("config/moderation.toml"));

    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/moderation.toml"), BASE).unwrap();
    let cfg = ModerationConfig::from_toml().unwrap();
    assert_eq!(cfg.profanity.trigger_on, 2.0);

    env::set_current_dir(old).unwrap();
}

#[test]
fn invalid_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[service]\nbot_user_id = 0\n").unwrap();
    let err = ModerationConfig::from_path(&path).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("bad.toml"), "{msg}");
    assert!(msg.contains("bot user id"), "{msg}");
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/moderation.toml");
    let cfg = ModerationConfig::from_path(&path).unwrap();
    let (m, sched) = Moderator::from_config(&cfg).unwrap();
    assert!(m.spam().is_some());
    // "daily" opts out of sweeping
    assert_eq!(sched.len(), 2);
    assert_eq!(m.cooldowns().len(), 2);
}

#[tokio::test]
async fn hot_reload_swaps_lexicon_and_keeps_it_on_bad_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moderation.toml");
    fs::write(&path, BASE).unwrap();

    let cfg = ModerationConfig::from_path(&path).unwrap();
    let (m, _sched) = Moderator::from_config(&cfg).unwrap();
    let handle = m.scorer().clone();
    assert_eq!(handle.score("spam here").matches().len(), 1);

    let task = spawn_hot_reload(handle.clone(), path.clone(), std::time::Duration::from_millis(50));
    // let the watcher record the initial mtime
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let updated = BASE.replace("word = \"spam\"", "word = \"eggs\"");
    write_newer(&path, &updated);
    wait_until(|| handle.score("eggs here").matches().len() == 1).await;
    assert_eq!(handle.score("spam here").matches().len(), 0);

    write_newer(&path, "[service]\nbot_user_id = 77\n[[profanity.lexicon]]\nword = \"\"\nweight = 1.0\n");
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert_eq!(handle.score("eggs here").matches().len(), 1);

    task.abort();
}

// Bump the mtime past the previous write even on coarse filesystems.
fn write_newer(path: &std::path::Path, content: &str) {
    let before = fs::metadata(path).and_then(|m| m.modified()).unwrap();
    fs::write(path, content).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(before + std::time::Duration::from_secs(2)).unwrap();
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
    }
    panic!("condition not reached");
}
