use bpaf::Bpaf;
use dbyaml::{DatabaseTemplate, Placeholder};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(generate(definition_args))]
pub struct DefinitionArgs {
    /// Database name
    #[bpaf(positional("NAME"))]
    pub name: String,
}

/// The block `add` would insert for `name`.
///
/// # Errors
///
/// Returns an error if `name` is not a valid database name.
pub fn block(name: &str, template: &DatabaseTemplate) -> Result<String, dbyaml::Error> {
    dbyaml::validate_name(name)?;
    Ok(dbyaml::synthesize::definition_block(
        name,
        template,
        Placeholder::default(),
    ))
}

pub fn run(args: &DefinitionArgs) -> anyhow::Result<()> {
    let config = dbyaml_config::load()?;
    println!("{}", block(&args.name, &config.template())?);
    Ok(())
}
