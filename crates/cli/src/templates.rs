//! `routerecon templates`: the named template store.

use std::path::PathBuf;

use clap::Subcommand;
use routerecon_io::{JsonStore, SaveOutcome};
use routerecon_payload::Template;

use crate::output::{emit_json, read_text};
use crate::{CliError, Ctx};

#[derive(Subcommand)]
pub(crate) enum TemplateCommands {
    /// List stored templates
    List,

    /// Print a stored template
    Show {
        /// Template name (".json" optional)
        name: String,
    },

    /// Validate a template file and store it under a name
    #[command(after_help = "\
Examples:
  routerecon templates save vq-update ./vq.json
  routerecon templates save vq-update.json ./vq-v2.json")]
    Save {
        /// Template name (".json" optional)
        name: String,

        /// Template JSON to store
        file: PathBuf,
    },

    /// Remove a stored template
    Delete {
        /// Template name (".json" optional)
        name: String,
    },
}

pub(crate) fn cmd_templates(ctx: &Ctx, cmd: TemplateCommands) -> Result<(), CliError> {
    let store = JsonStore::new(&ctx.settings.paths.template_dir);
    log::debug!("template store: {}", store.dir().display());

    match cmd {
        TemplateCommands::List => {
            let names = store.list().map_err(CliError::io)?;
            if names.is_empty() {
                eprintln!("no templates in {}", store.dir().display());
            }
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        TemplateCommands::Show { name } => {
            let document = store.load(&store_name(&name)).map_err(CliError::io)?;
            emit_json(&document, true, None)
        }
        TemplateCommands::Save { name, file } => {
            let name = store_name(&name);
            let template = Template::from_json(&read_text(&file)?).map_err(CliError::template)?;

            let outcome = store.save(&name, template.body()).map_err(CliError::io)?;
            match outcome {
                SaveOutcome::Created => eprintln!("created {name}"),
                SaveOutcome::Updated => eprintln!("updated {name}"),
            }
            Ok(())
        }
        TemplateCommands::Delete { name } => {
            let name = store_name(&name);
            store.delete(&name).map_err(CliError::io)?;
            eprintln!("deleted {name}");
            Ok(())
        }
    }
}

fn store_name(name: &str) -> String {
    if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.json")
    }
}
