//! Deps command implementation.
//!
//! Prints the dependency closure of the working tree as the dependency check
//! computes it, flagging packages that cannot be found in the vendor tree.
//! Nothing is stashed; uncommitted edits are included.

use std::path::Path;

use anyhow::{Context, Result, bail};

use vendo_lib::config::Layout;
use vendo_lib::imports::{BuildResolver, GoListResolver, project_dependencies};
use vendo_lib::manifest::Manifest;
use vendo_lib::platform::{Platform, parse_platforms};

use crate::output::{print_info, print_item, print_json, print_warning, symbols};

fn target_platforms(layout: &Layout, list: Option<&str>) -> Result<Vec<Platform>> {
  if let Some(list) = list {
    return Ok(parse_platforms(list)?);
  }
  let path = layout.abs(layout.manifest());
  let manifest = Manifest::load(&path)?
    .with_context(|| format!("{} not found; pass --platforms", path.display()))?;
  if manifest.platforms.is_empty() {
    bail!("{} declares no platforms; pass --platforms", layout.manifest());
  }
  Ok(manifest.platforms)
}

pub fn cmd_deps(root: &Path, platforms: Option<&str>, json: bool) -> Result<()> {
  let layout = Layout::from_env(root)?;
  let platforms = target_platforms(&layout, platforms)?;
  let resolver = GoListResolver::default();
  let search_path = layout.abs(layout.vendor_dir());

  let deps = project_dependencies(root, &platforms, &resolver, &search_path)?;
  let missing = resolver.unresolved(&deps, &search_path)?;

  if json {
    let platforms: Vec<String> = platforms.iter().map(Platform::to_string).collect();
    let json_output = serde_json::json!({
      "platforms": platforms,
      "dependencies": deps.iter().collect::<Vec<_>>(),
      "unresolved": missing.iter().collect::<Vec<_>>(),
    });
    return print_json(&json_output);
  }

  let names: Vec<String> = platforms.iter().map(Platform::to_string).collect();
  print_info(&format!("{} dependencies for {}", deps.len(), names.join(", ")));
  for id in deps.iter() {
    let marker = if missing.contains(id) { symbols::MISSING } else { symbols::INFO };
    print_item(marker, id);
  }
  if !missing.is_empty() {
    print_warning(&format!(
      "{} not found under {}: {}",
      missing.len(),
      layout.vendor_dir(),
      missing.iter().collect::<Vec<_>>().join(" ")
    ));
  }
  Ok(())
}
