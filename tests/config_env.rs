use rental_price_watch::Config;
use std::fs;

// Own test binary: changes the working directory of the process.
#[test]
fn from_env_reads_the_dotenv_file_itself() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "EH_CAR_NAME=丰田卡罗拉\n\
         SMTP_HOST=smtp.dotenv.test\n\
         SMTP_PORT=465\n\
         SMTP_USER=watch@dotenv.test\n\
         SMTP_PASS=secret\n\
         SMTP_FROM=watch@dotenv.test\n\
         EMAIL_TO=ops@dotenv.test\n",
    )
    .unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let config = Config::from_env().unwrap();

    assert_eq!(config.target.car_name, "丰田卡罗拉");
    assert_eq!(config.smtp.host, "smtp.dotenv.test");
    assert_eq!(config.smtp.port, 465);
    assert_eq!(config.smtp.to, "ops@dotenv.test");
}
