mod testlib;

use testlib::*;

#[test]
fn bad_query() {
  run().args(["cat $", "notfound"]).assert().failure().stderr(
    r#"query parse error:
    cat $
        ^
error: unexpected character
"#,
  );
}

#[test]
fn missing_file() {
  run()
    .args(["cat", "notfound"])
    .assert()
    .failure()
    .stderr(format!(
      "file not found: {}/notfound\n",
      env!("CARGO_MANIFEST_DIR")
    ));
}

#[test]
fn cat_and_dog() {
  run().arg("cat dog").arg(pets()).assert().success().stdout(
    r#"1:A dog chased the cat up a tree.
5:The cat and the dog slept together.
"#,
  );
}

#[test]
fn bird_or_not_the() {
  run().arg("bird | !the").arg(pets()).assert().success().stdout(
    r#"4:A bird sang from the window sill.
7:The cat watched the bird for hours.
8:A hamster ran on its wheel at night.
11:The bird and the fish never met.
"#,
  );
}

#[test]
fn range() {
  run()
    .args(["!cat", "--from", "3", "--to", "9"])
    .arg(pets())
    .assert()
    .success()
    .stdout(
      r#"3:The dog barked at the mail carrier.
4:A bird sang from the window sill.
6:Nobody fed the fish this morning.
8:A hamster ran on its wheel at night.
"#,
    );
}
