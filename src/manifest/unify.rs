//! Unification of fragments into one applet table.
//!
//! Fragments are folded, in order, into per-name builders. Every scalar
//! slot remembers which fragment set it so that a conflict can name both
//! sides. Lists concatenate in fragment order; `command` is the exception
//! and unifies like a scalar.

use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;

use super::fragment::{AppletFragment, Fragment, ResourceFragment};
use crate::applet::{Applet, AppletTable, DEFAULT_TAG, Resource, validate_graph};
use crate::error::{DockerboxError, Result};

/// A value together with the origin of the fragment that set it.
#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    origin: String,
}

/// Context for conflict reporting.
struct Site<'a> {
    entity: &'static str,
    name: &'a str,
    origin: &'a str,
}

fn unify<T>(slot: &mut Option<Slot<T>>, incoming: Option<T>, field: &'static str, site: &Site<'_>) -> Result<()>
where
    T: PartialEq + Debug,
{
    let Some(value) = incoming else {
        return Ok(());
    };
    match slot {
        None => {
            *slot = Some(Slot {
                value,
                origin: site.origin.to_string(),
            });
            Ok(())
        }
        Some(existing) if existing.value == value => Ok(()),
        Some(existing) => Err(DockerboxError::UnificationConflict {
            entity: site.entity,
            name: site.name.to_string(),
            field,
            first: format!("{:?}", existing.value),
            first_origin: existing.origin.clone(),
            second: format!("{value:?}"),
            second_origin: site.origin.to_string(),
        }),
    }
}

fn take<T>(slot: Option<Slot<T>>) -> Option<T> {
    slot.map(|s| s.value)
}

/// Append hook references not already present, keeping first-seen order.
///
/// Hooks are graph edges: naming the same hook twice must not run it twice.
fn extend_unique(hooks: &mut Vec<String>, incoming: Vec<String>) {
    for hook in incoming {
        if !hooks.contains(&hook) {
            hooks.push(hook);
        }
    }
}

#[derive(Default)]
struct AppletBuilder {
    name: Option<Slot<String>>,
    image: Option<Slot<String>>,
    image_tag: Option<Slot<String>>,
    entrypoint: Option<Slot<String>>,
    work_dir: Option<Slot<String>>,
    hostname: Option<Slot<String>>,
    restart: Option<Slot<String>>,
    network: Option<Slot<String>>,

    rm: Option<Slot<bool>>,
    interactive: Option<Slot<bool>>,
    tty: Option<Slot<bool>>,
    privileged: Option<Slot<bool>>,
    detach: Option<Slot<bool>>,
    kill: Option<Slot<bool>>,
    pull: Option<Slot<bool>>,

    command: Option<Slot<Vec<String>>>,

    dns: Vec<String>,
    dns_search: Vec<String>,
    dns_option: Vec<String>,
    environment: Vec<String>,
    env_file: Vec<String>,
    ports: Vec<String>,
    volumes: Vec<String>,
    links: Vec<String>,
    networks: Vec<String>,
    before_hooks: Vec<String>,
    after_hooks: Vec<String>,

    /// First fragment that mentioned the applet.
    origin: String,
}

impl AppletBuilder {
    fn absorb(&mut self, key: &str, fragment: AppletFragment, origin: &str) -> Result<()> {
        if let Some(applet_name) = &fragment.applet_name
            && applet_name != key
        {
            return Err(DockerboxError::validation(
                origin,
                format!("applets.{key}.applet_name"),
                format!("'{applet_name}' does not match the applet key '{key}'"),
            ));
        }

        let site = Site {
            entity: "applet",
            name: key,
            origin,
        };

        unify(&mut self.name, fragment.name, "name", &site)?;
        unify(&mut self.image, fragment.image, "image", &site)?;
        unify(&mut self.image_tag, fragment.image_tag, "image_tag", &site)?;
        unify(&mut self.entrypoint, fragment.entrypoint, "entrypoint", &site)?;
        unify(&mut self.work_dir, fragment.work_dir, "work_dir", &site)?;
        unify(&mut self.hostname, fragment.hostname, "hostname", &site)?;
        unify(&mut self.restart, fragment.restart, "restart", &site)?;
        unify(&mut self.network, fragment.network, "network", &site)?;

        unify(&mut self.rm, fragment.rm, "rm", &site)?;
        unify(&mut self.interactive, fragment.interactive, "interactive", &site)?;
        unify(&mut self.tty, fragment.tty, "tty", &site)?;
        unify(&mut self.privileged, fragment.privileged, "privileged", &site)?;
        unify(&mut self.detach, fragment.detach, "detach", &site)?;
        unify(&mut self.kill, fragment.kill, "kill", &site)?;
        unify(&mut self.pull, fragment.pull, "pull", &site)?;

        unify(&mut self.command, fragment.command, "command", &site)?;

        self.dns.extend(fragment.dns);
        self.dns_search.extend(fragment.dns_search);
        self.dns_option.extend(fragment.dns_option);
        self.environment.extend(fragment.environment);
        self.env_file.extend(fragment.env_file);
        self.ports.extend(fragment.ports);
        self.volumes.extend(fragment.volumes);
        self.links.extend(fragment.links);
        self.networks.extend(fragment.networks);
        extend_unique(&mut self.before_hooks, fragment.before_hooks);
        extend_unique(&mut self.after_hooks, fragment.after_hooks);

        Ok(())
    }

    /// Apply defaults and check required fields.
    fn finish(self, key: &str) -> Result<Applet> {
        let image = take(self.image).unwrap_or_default();
        if image.is_empty() {
            return Err(DockerboxError::validation(
                self.origin,
                format!("applets.{key}.image"),
                "required field is missing or empty",
            ));
        }

        Ok(Applet {
            applet_name: key.to_string(),
            name: take(self.name).unwrap_or_default(),
            image,
            tag: take(self.image_tag).unwrap_or_else(|| DEFAULT_TAG.to_string()),
            entrypoint: take(self.entrypoint).unwrap_or_default(),
            work_dir: take(self.work_dir).unwrap_or_default(),
            hostname: take(self.hostname).unwrap_or_default(),
            restart: take(self.restart).unwrap_or_default(),
            network: take(self.network).unwrap_or_default(),
            rm: take(self.rm).unwrap_or(true),
            interactive: take(self.interactive).unwrap_or(true),
            tty: take(self.tty).unwrap_or(true),
            privileged: take(self.privileged).unwrap_or(false),
            detach: take(self.detach).unwrap_or(false),
            kill: take(self.kill).unwrap_or(false),
            pull: take(self.pull).unwrap_or(false),
            dns: self.dns,
            dns_search: self.dns_search,
            dns_option: self.dns_option,
            environment: self.environment,
            env_file: self.env_file,
            ports: self.ports,
            volumes: self.volumes,
            links: self.links,
            networks: self.networks,
            before_hooks: self.before_hooks,
            after_hooks: self.after_hooks,
            command: take(self.command).unwrap_or_default(),
        })
    }
}

#[derive(Default)]
struct ResourceBuilder {
    name: Option<Slot<String>>,
    driver: Option<Slot<String>>,
}

impl ResourceBuilder {
    fn absorb(&mut self, entity: &'static str, key: &str, fragment: ResourceFragment, origin: &str) -> Result<()> {
        let site = Site {
            entity,
            name: key,
            origin,
        };
        unify(&mut self.name, fragment.name, "name", &site)?;
        unify(&mut self.driver, fragment.driver, "driver", &site)?;
        Ok(())
    }

    fn finish(self, key: &str) -> Resource {
        let name = take(self.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| key.to_string());
        Resource {
            name,
            driver: take(self.driver),
        }
    }
}

fn absorb_resources(
    builders: &mut BTreeMap<String, ResourceBuilder>,
    entity: &'static str,
    entries: BTreeMap<String, ResourceFragment>,
    origin: &str,
) -> Result<()> {
    for (key, fragment) in entries {
        builders
            .entry(key.clone())
            .or_default()
            .absorb(entity, &key, fragment, origin)?;
    }
    Ok(())
}

/// Merge fragments, in order, into a validated applet table.
pub fn merge(fragments: Vec<Fragment>) -> Result<AppletTable> {
    let mut applets: BTreeMap<String, AppletBuilder> = BTreeMap::new();
    let mut volumes: BTreeMap<String, ResourceBuilder> = BTreeMap::new();
    let mut networks: BTreeMap<String, ResourceBuilder> = BTreeMap::new();
    let mut table = AppletTable::default();

    for fragment in fragments {
        let origin = fragment.origin;
        debug!(
            origin = %origin,
            applets = fragment.doc.applets.len(),
            "merging fragment"
        );

        for (key, applet) in fragment.doc.applets {
            let builder = applets.entry(key.clone()).or_insert_with(|| AppletBuilder {
                origin: origin.clone(),
                ..Default::default()
            });
            builder.absorb(&key, applet, &origin)?;
        }
        absorb_resources(&mut volumes, "volume", fragment.doc.volumes, &origin)?;
        absorb_resources(&mut networks, "network", fragment.doc.networks, &origin)?;
        table.ignore.extend(fragment.doc.ignore);
    }

    for (key, builder) in applets {
        let applet = builder.finish(&key)?;
        table.applets.insert(key, applet);
    }
    for (key, builder) in volumes {
        let resource = builder.finish(&key);
        table.volumes.insert(key, resource);
    }
    for (key, builder) in networks {
        let resource = builder.finish(&key);
        table.networks.insert(key, resource);
    }

    validate_graph(&table)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(origin: &str, yaml: &str) -> Fragment {
        Fragment::parse_with_env(origin, yaml, &|_: &str| None).unwrap()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let table = merge(vec![fragment("a.dbx.yaml", "applets:\n  web:\n    image: nginx\n")]).unwrap();
        let web = table.get("web").unwrap();
        assert_eq!(web, &Applet::new("web", "nginx"));
    }

    #[test]
    fn explicit_false_survives_defaults() {
        let table = merge(vec![fragment(
            "a.dbx.yaml",
            "applets:\n  web:\n    image: nginx\n    rm: false\n    tty: false\n",
        )])
        .unwrap();
        let web = table.get("web").unwrap();
        assert!(!web.rm);
        assert!(!web.tty);
        assert!(web.interactive);
    }

    #[test]
    fn equal_scalars_unify() {
        let table = merge(vec![
            fragment("a.dbx.yaml", "applets:\n  web:\n    image: nginx\n    name: web\n"),
            fragment("b.dbx.yaml", "applets:\n  web:\n    image: nginx\n    rm: true\n"),
        ])
        .unwrap();
        let web = table.get("web").unwrap();
        assert_eq!(web.image, "nginx");
        assert_eq!(web.name, "web");
    }

    #[test]
    fn differing_scalars_conflict() {
        let err = merge(vec![
            fragment("a.dbx.yaml", "applets:\n  web:\n    image: nginx\n"),
            fragment("b.dbx.yaml", "applets:\n  web:\n    image: httpd\n"),
        ])
        .unwrap_err();

        match err {
            DockerboxError::UnificationConflict {
                entity,
                name,
                field,
                first,
                first_origin,
                second,
                second_origin,
            } => {
                assert_eq!(entity, "applet");
                assert_eq!(name, "web");
                assert_eq!(field, "image");
                assert_eq!(first, "\"nginx\"");
                assert_eq!(first_origin, "a.dbx.yaml");
                assert_eq!(second, "\"httpd\"");
                assert_eq!(second_origin, "b.dbx.yaml");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn lists_concatenate_in_fragment_order() {
        let table = merge(vec![
            fragment("a.dbx.yaml", "applets:\n  web:\n    image: nginx\n    ports: [\"80:80\"]\n"),
            fragment("b.dbx.yaml", "applets:\n  web:\n    ports: [\"443:443\", \"80:80\"]\n"),
        ])
        .unwrap();
        assert_eq!(table.get("web").unwrap().ports, vec!["80:80", "443:443", "80:80"]);
    }

    #[test]
    fn command_is_exclusive() {
        let ok = merge(vec![
            fragment("a.dbx.yaml", "applets:\n  t:\n    image: alpine\n    command: [sh]\n"),
            fragment("b.dbx.yaml", "applets:\n  t:\n    command: [sh]\n"),
        ])
        .unwrap();
        assert_eq!(ok.get("t").unwrap().command, vec!["sh"]);

        let err = merge(vec![
            fragment("a.dbx.yaml", "applets:\n  t:\n    image: alpine\n    command: [sh]\n"),
            fragment("b.dbx.yaml", "applets:\n  t:\n    command: [bash]\n"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            DockerboxError::UnificationConflict { field: "command", .. }
        ));
    }

    #[test]
    fn missing_image_is_fatal() {
        let err = merge(vec![fragment("a.dbx.yaml", "applets:\n  web:\n    name: web\n")]).unwrap_err();
        match err {
            DockerboxError::ConfigValidation { origin, path, .. } => {
                assert_eq!(origin, "a.dbx.yaml");
                assert_eq!(path, "applets.web.image");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn applet_name_must_match_key() {
        let ok = merge(vec![fragment(
            "a.dbx.yaml",
            "applets:\n  web:\n    applet_name: web\n    image: nginx\n",
        )]);
        assert!(ok.is_ok());

        let err = merge(vec![fragment(
            "a.dbx.yaml",
            "applets:\n  web:\n    applet_name: api\n    image: nginx\n",
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            DockerboxError::ConfigValidation { ref path, .. } if path == "applets.web.applet_name"
        ));
    }

    #[test]
    fn resources_default_name_to_key_and_conflict_on_driver() {
        let table = merge(vec![
            fragment("a.dbx.yaml", "volumes:\n  data:\n"),
            fragment("b.dbx.yaml", "volumes:\n  data:\n    driver: local\n"),
        ])
        .unwrap();
        assert_eq!(
            table.volumes["data"],
            Resource {
                name: "data".into(),
                driver: Some("local".into())
            }
        );

        let err = merge(vec![
            fragment("a.dbx.yaml", "networks:\n  net:\n    driver: bridge\n"),
            fragment("b.dbx.yaml", "networks:\n  net:\n    driver: overlay\n"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            DockerboxError::UnificationConflict { entity: "network", field: "driver", .. }
        ));
    }

    #[test]
    fn ignore_sets_union() {
        let table = merge(vec![
            fragment("a.dbx.yaml", "ignore: [a]\n"),
            fragment("b.dbx.yaml", "ignore: [b, a]\n"),
        ])
        .unwrap();
        assert_eq!(table.ignore.len(), 2);
    }

    #[test]
    fn hook_graph_is_checked_after_merge() {
        let err = merge(vec![
            fragment("a.dbx.yaml", "applets:\n  a:\n    image: x\n    before_hooks: [b]\n"),
            fragment("b.dbx.yaml", "applets:\n  b:\n    image: y\n    before_hooks: [a]\n"),
        ])
        .unwrap_err();
        assert!(matches!(err, DockerboxError::Cycle { .. }));

        let err = merge(vec![fragment(
            "a.dbx.yaml",
            "applets:\n  a:\n    image: x\n    after_hooks: [ghost]\n",
        )])
        .unwrap_err();
        assert!(matches!(err, DockerboxError::MissingReference { .. }));
    }

    #[test]
    fn merge_is_idempotent_for_repeated_fragment() {
        let text = "applets:\n  web:\n    image: nginx\n    name: web\n    rm: false\n";
        let once = merge(vec![fragment("a.dbx.yaml", text)]).unwrap();
        let twice = merge(vec![fragment("a.dbx.yaml", text), fragment("b.dbx.yaml", text)]).unwrap();
        assert_eq!(once.get("web").unwrap().image, twice.get("web").unwrap().image);
        assert_eq!(once.get("web").unwrap().rm, twice.get("web").unwrap().rm);
    }

    #[test]
    fn repeated_hook_fragment_is_not_a_cycle() {
        let text = "applets:\n  a:\n    image: x\n    before_hooks: [b]\n    after_hooks: [c]\n  b:\n    image: y\n  c:\n    image: z\n";
        let once = merge(vec![fragment("one.dbx.yaml", text)]).unwrap();
        let twice = merge(vec![fragment("one.dbx.yaml", text), fragment("two.dbx.yaml", text)]).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.get("a").unwrap().before_hooks, vec!["b"]);
        assert_eq!(twice.get("a").unwrap().after_hooks, vec!["c"]);
    }

    #[test]
    fn hooks_from_several_fragments_union_in_order() {
        let table = merge(vec![
            fragment("a.dbx.yaml", "applets:\n  a:\n    image: x\n    before_hooks: [b, c]\n  b:\n    image: y\n  c:\n    image: z\n"),
            fragment("b.dbx.yaml", "applets:\n  a:\n    before_hooks: [c, d]\n  d:\n    image: w\n"),
        ])
        .unwrap();
        assert_eq!(table.get("a").unwrap().before_hooks, vec!["b", "c", "d"]);
    }
}
