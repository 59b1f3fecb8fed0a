// ABOUTME: Line-oriented split of a whole-database dump into schema and data parts
// ABOUTME: Tracks INSERT blocks textually; drops table lock directives from schema

/// Keep the schema lines, the data lines, or both, of a complete dump
///
/// A line opens an INSERT block when its trimmed form starts with
/// `INSERT INTO`; the block closes on the first line (possibly the same one)
/// whose trimmed form contains `;`. Lines inside a block are kept iff
/// `keep_data`. Lines outside are kept iff `keep_schema`, except `LOCK TABLES`
/// / `UNLOCK TABLES` lines, which are always dropped.
///
/// This is a textual heuristic: a `;` inside a string literal on a
/// continuation line ends the block early.
///
/// # Examples
///
/// ```
/// # use mysql_dump_migrator::migration::filter::filter_dump;
/// let dump = "CREATE TABLE t (id int);\nLOCK TABLES `t` WRITE;\nINSERT INTO t VALUES (1);\nUNLOCK TABLES;";
/// assert_eq!(filter_dump(dump, true, false), "CREATE TABLE t (id int);");
/// assert_eq!(filter_dump(dump, false, true), "INSERT INTO t VALUES (1);");
/// ```
pub fn filter_dump(input: &str, keep_schema: bool, keep_data: bool) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_insert = false;

    for line in input.split('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with("INSERT INTO") {
            in_insert = true;
        }

        if in_insert {
            if keep_data {
                out.push(line);
            }
            if trimmed.contains(';') {
                in_insert = false;
            }
            continue;
        }

        if !keep_schema {
            continue;
        }
        if trimmed.starts_with("LOCK TABLES") || trimmed.starts_with("UNLOCK TABLES") {
            continue;
        }
        out.push(line);
    }

    out.join("\n")
}
