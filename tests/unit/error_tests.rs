use taskdesk::AppError;

#[test]
fn display_prefixes_by_variant() {
    let cases = [
        (AppError::Config("bad".into()), "config: bad"),
        (AppError::Db("locked".into()), "db: locked"),
        (AppError::Slack("down".into()), "slack: down"),
        (AppError::Mcp("broken".into()), "mcp: broken"),
        (AppError::NotFound("task 3".into()), "not found: task 3"),
        (AppError::Conflict("claimed".into()), "conflict: claimed"),
        (AppError::Validation("priority".into()), "validation: priority"),
        (AppError::Dispatch("spawn".into()), "dispatch: spawn"),
        (AppError::Timeout("300000 ms".into()), "timeout: 300000 ms"),
        (AppError::Io("denied".into()), "io: denied"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn sqlx_errors_map_to_db() {
    let err: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(err, AppError::Db(_)));
}

#[test]
fn io_errors_map_to_io() {
    let err: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
    assert!(matches!(err, AppError::Io(_)));
}

#[test]
fn toml_errors_map_to_config() {
    let parse_err = toml::from_str::<toml::Value>("= nope").expect_err("invalid toml");
    let err: AppError = parse_err.into();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn implements_std_error() {
    fn takes_error(_: &dyn std::error::Error) {}
    takes_error(&AppError::Db("x".into()));
}
