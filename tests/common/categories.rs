use async_trait::async_trait;
use staged_import::{Category, ChangesRegistry, ImportOptions, Multi};
use std::fmt;
use std::time::Duration;

/// Test categories whose executor turns every change into one named operation.
///
/// Special payloads drive failure paths:
/// - `"crash"` makes the executor return an error
/// - `"panic"` makes the executor panic
/// - `"hang"` never returns
/// - `"slow:<ms>"` sleeps before staging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestCategory {
    Addresses,
    Blocks,
    Transactions,
    Logs,
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Addresses => "addresses",
            Self::Blocks => "blocks",
            Self::Transactions => "transactions",
            Self::Logs => "logs",
        };
        write!(f, "{name}")
    }
}

pub type TestUnit = Multi<String>;

#[async_trait]
impl Category for TestCategory {
    type Change = String;
    type Unit = TestUnit;

    async fn execute(
        &self,
        unit: TestUnit,
        changes: Vec<String>,
        _options: &ImportOptions,
    ) -> anyhow::Result<TestUnit> {
        let mut unit = unit;
        for change in changes {
            match change.as_str() {
                "crash" => anyhow::bail!("{self} executor rejected change"),
                "panic" => panic!("{self} executor panicked"),
                "hang" => std::future::pending::<()>().await,
                other => {
                    if let Some(ms) = other.strip_prefix("slow:") {
                        tokio::time::sleep(Duration::from_millis(ms.parse()?)).await;
                    }
                }
            }
            unit = unit.push(format!("{self}:{change}"), change)?;
        }
        Ok(unit)
    }
}

/// Changes `prefix1..=prefixN`
pub fn changes(prefix: &str, count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("{prefix}{i}")).collect()
}

pub fn registry_of(entries: Vec<(TestCategory, Vec<String>)>) -> ChangesRegistry<TestCategory> {
    entries.into_iter().collect()
}

/// Operations of `unit`, in staging order
pub fn staged(unit: &TestUnit) -> Vec<String> {
    unit.operations().cloned().collect()
}
