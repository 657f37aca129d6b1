use formpilot_core::SchemaRegistry;

/// Prints the binary version and the size of the canonical form.
#[derive(Debug, Clone, Copy)]
pub struct VersionStrategy;

impl super::CommandStrategy for VersionStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let registry = SchemaRegistry::new();
        println!("formpilot {}", env!("CARGO_PKG_VERSION"));
        println!(
            "form schema: {} fields, {} keys",
            registry.len(),
            registry.dotted_keys().len()
        );
        Ok(())
    }
}
