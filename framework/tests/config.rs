use classy_test::{ClassyConfig, Context};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_init_loads_dotenv_then_stores_global_config() {
    let root = std::env::temp_dir().join(format!("classy-config-{}", std::process::id()));
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(
        root.join(".env.testing"),
        "CLASSY_STRICT=yes\nCLASSY_PROCESS=server\nCLASSY_TEST_TIMEOUT_MS=1500\n",
    )
    .unwrap();
    std::fs::write(root.join(".env"), "CLASSY_PROCESS=client\n").unwrap();

    let config = ClassyConfig::init(&root);

    assert_eq!(
        config,
        &ClassyConfig {
            strict: true,
            process: Context::Server,
            test_timeout: Duration::from_millis(1500),
        }
    );
    assert_eq!(ClassyConfig::try_from_env().as_ref(), Ok(config));
    assert!(std::ptr::eq(ClassyConfig::global(), config));

    std::fs::write(root.join(".env.testing"), "CLASSY_TEST_TIMEOUT_MS=10\n").unwrap();
    assert!(std::ptr::eq(ClassyConfig::init(&root), config));
    assert_eq!(config.test_timeout, Duration::from_millis(1500));

    std::fs::remove_dir_all(&root).unwrap();
}
