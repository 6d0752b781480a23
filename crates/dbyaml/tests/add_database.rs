use dbyaml::{DatabaseTemplate, Definition, Error, PatchError, add_database, check_database};
use pretty_assertions::assert_eq;

const RAILS_7: &str = include_str!("fixtures/rails-7.yml");
const RAILS_8: &str = include_str!("fixtures/rails-8.yml");

fn add(source: &str, name: &str) -> String {
    add_database(source, name, &DatabaseTemplate::default())
        .expect("add database")
        .content
}

#[test]
fn two_databases_on_a_rails_7_file() {
    let content = add(&add(RAILS_7, "queue"), "cache");
    insta::assert_snapshot!(content, @r##"
    # SQLite. Versions 3.8.0 and up are supported.
    #   gem install sqlite3
    #
    #   Ensure the SQLite 3 gem is defined in your Gemfile
    #   gem "sqlite3"
    #
    default: &default
      adapter: sqlite3
      pool: <%= ENV.fetch("RAILS_MAX_THREADS") { 5 } %>
      timeout: 5000

    cache: &cache
      <<: *default
      migrations_paths: db/cache_migrate
      database: storage/<%= Rails.env %>-cache.sqlite3

    queue: &queue
      <<: *default
      migrations_paths: db/queue_migrate
      database: storage/<%= Rails.env %>-queue.sqlite3

    development:
      primary:
        <<: *default
        database: storage/development.sqlite3
      queue: *queue
      cache: *cache

    # Warning: The database defined as "test" will be erased and
    # re-generated from your development database when you run "rake".
    # Do not set this db to the same as development or production.
    test:
      primary:
        <<: *default
        database: storage/test.sqlite3
      queue: *queue
      cache: *cache


    # SQLite3 write its data on the local filesystem, as such it requires
    # persistent disks. If you are deploying to a managed service, you should
    # make sure it provides disk persistence, as many don't.
    #
    # Similarly, if you deploy your application as a Docker container, you must
    # ensure the database is located in a persisted volume.
    production:
      primary:
        <<: *default
        # database: path/to/persistent/storage/production.sqlite3
      queue: *queue
      cache: *cache
    "##);
}

#[test]
fn adding_again_is_a_no_op() {
    let template = DatabaseTemplate::default();
    let once = add(RAILS_7, "queue");
    let twice = add_database(&once, "queue", &template).expect("second addition");
    assert_eq!(twice.content, once);
    assert_eq!(twice.definition, Definition::AlreadyPresent);
    assert_eq!(twice.wired, Vec::<String>::new());
    assert_eq!(twice.skipped, ["development", "test", "production"]);
}

#[test]
fn commented_placeholder_survives() {
    let content = add(RAILS_7, "cable");
    assert!(content.contains("    # database: path/to/persistent/storage/production.sqlite3\n"));
    assert!(!content.contains("\n    database: path/to/persistent"));
}

#[test]
fn rails_8_production_gets_an_extra_entry() {
    let addition = add_database(RAILS_8, "errors", &DatabaseTemplate::default()).expect("add");
    assert_eq!(addition.wired, ["development", "test", "production"]);
    assert!(addition.content.ends_with(
        "    database: storage/production_queue.sqlite3\n    migrations_paths: db/queue_migrate\n  errors: *errors\n"
    ));
    assert!(addition.content.contains(
        "development:\n  primary:\n    <<: *default\n    database: storage/development.sqlite3\n  errors: *errors\n"
    ));
}

#[test]
fn rails_8_production_keeps_its_own_cache() {
    let addition = add_database(RAILS_8, "cache", &DatabaseTemplate::default()).expect("add");
    assert_eq!(addition.wired, ["development", "test"]);
    assert_eq!(addition.defined, ["production"]);
    assert!(addition.content.contains("  cache:\n    <<: *default\n    database: storage/production_cache.sqlite3\n"));
    assert_eq!(addition.content.matches("cache: *cache").count(), 2);
}

#[test]
fn lookalike_text_is_not_a_reference() {
    let source = "default: &default\n  adapter: sqlite3\ndevelopment:\n  <<: *default\n  note: \"cache: *cache\"\n";
    let addition = add_database(source, "cache", &DatabaseTemplate::default()).expect("add");
    assert_eq!(addition.wired, ["development"]);
    assert!(addition.content.ends_with(
        "development:\n  primary:\n    <<: *default\n    note: \"cache: *cache\"\n  cache: *cache\n"
    ));
}

#[test]
fn environment_names_sharing_a_suffix_are_rewritten_separately() {
    let source = "default: &default\n  adapter: sqlite3\n\ntest:\n  <<: *default\n\nci_test:\n  <<: *default\n  database: ci.sqlite3\n";
    let addition = add_database(source, "cache", &DatabaseTemplate::default()).expect("add");
    assert_eq!(addition.wired, ["test", "ci_test"]);
    assert!(addition.content.contains("\ntest:\n  primary: *default\n  cache: *cache\n\n"));
    assert!(addition.content.ends_with(
        "\nci_test:\n  primary:\n    <<: *default\n    database: ci.sqlite3\n  cache: *cache\n"
    ));
}

#[test]
fn merge_only_environments_sharing_a_suffix() {
    let source = "default: &default\n  adapter: sqlite3\nproduction:\n  <<: *default\npre_production:\n  <<: *default\n";
    let addition = add_database(source, "queue", &DatabaseTemplate::default()).expect("add");
    assert_eq!(addition.wired, ["production", "pre_production"]);
    assert!(addition.content.ends_with(
        "\nproduction:\n  primary: *default\n  queue: *queue\npre_production:\n  primary: *default\n  queue: *queue\n"
    ));
}

#[test]
fn unrelated_key_with_the_same_name_is_kept_under_primary() {
    let source = "default: &default\n  adapter: sqlite3\ndevelopment:\n  <<: *default\n  cache: true\n";
    let content = add(source, "cache");
    assert!(content.ends_with("development:\n  primary:\n    <<: *default\n    cache: true\n  cache: *cache\n"));
}

#[test]
fn custom_template() {
    let template = DatabaseTemplate {
        default_anchor: "base".to_string(),
        migrations_paths: "db/{name}".to_string(),
        database: "<%= ENV[\"{name}_DATABASE\"] %>".to_string(),
    };
    let source = "base: &base\n  adapter: postgresql\nproduction:\n  <<: *base\n";
    let addition = add_database(source, "audit", &template).expect("add");
    assert_eq!(
        addition.content,
        "base: &base\n  adapter: postgresql\n\naudit: &audit\n  <<: *base\n  migrations_paths: db/audit\n  database: <%= ENV[\"audit_DATABASE\"] %>\nproduction:\n  primary: *base\n  audit: *audit\n"
    );
}

#[test]
fn environment_with_inline_comment_cannot_be_rewritten() {
    let source = "default: &default\n  adapter: sqlite3\ndevelopment:\n  <<: *default # shared\n  database: dev.sqlite3\n";
    let err = add_database(source, "cache", &DatabaseTemplate::default()).expect_err("should fail");
    assert!(matches!(&err, Error::Rewrite { source: PatchError::TextNotFound { .. }, .. }));
    assert_eq!(err.environment(), Some("development"));
}

#[test]
fn malformed_yaml_is_reported() {
    let err = add_database("default: &default\n  adapter: [sqlite3\n", "cache", &DatabaseTemplate::default())
        .expect_err("should fail");
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn check_after_additions() {
    let content = add(&add(RAILS_7, "queue"), "cache");
    for name in ["queue", "cache"] {
        let status = check_database(&content, name).expect("check");
        assert!(status.is_complete(), "{name}");
    }
    let status = check_database(&content, "cable").expect("check");
    assert!(!status.defined);
    assert_eq!(status.missing().count(), 3);
}
