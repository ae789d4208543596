use crate::foundation::error::InkframeError;
use crate::scene::device::{DeviceConfig, interval_from_secs};
use crate::scene::model::{NodeKind, Scene};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SchemaPathElem {
    Field(&'static str),
    Index(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaError {
    pub(crate) path: Vec<SchemaPathElem>,
    pub(crate) message: String,
}

impl SchemaError {
    fn at(path: &[SchemaPathElem], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return write!(f, "{}", self.message);
        }
        write!(f, "{}: {}", format_path(&self.path), self.message)
    }
}

fn format_path(path: &[SchemaPathElem]) -> String {
    let mut s = String::from("$");
    for p in path {
        match *p {
            SchemaPathElem::Field(name) => {
                s.push('.');
                s.push_str(name);
            }
            SchemaPathElem::Index(i) => {
                s.push('[');
                s.push_str(&i.to_string());
                s.push(']');
            }
        }
    }
    s
}

#[derive(Debug, Clone)]
pub(crate) struct SchemaErrors {
    pub(crate) errors: Vec<SchemaError>,
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

pub(crate) fn validate_device(def: &DeviceConfig) -> Result<(), SchemaErrors> {
    let mut errors = Vec::new();

    if def.width == 0 {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("width")],
            "width must be > 0",
        ));
    }
    if def.height == 0 {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("height")],
            "height must be > 0",
        ));
    }
    if let Err(err) = interval_from_secs(def.interval) {
        let message = match err {
            InkframeError::Validation(msg) => msg,
            other => other.to_string(),
        };
        errors.push(SchemaError::at(&[SchemaPathElem::Field("interval")], message));
    }
    if def.max_depth == 0 {
        errors.push(SchemaError::at(
            &[SchemaPathElem::Field("max_depth")],
            "max_depth must be > 0",
        ));
    }

    validate_scene_into(&def.scene, &[SchemaPathElem::Field("scene")], &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaErrors { errors })
    }
}

pub(crate) fn validate_scene(scene: &Scene) -> Result<(), SchemaErrors> {
    let mut errors = Vec::new();
    validate_scene_into(scene, &[], &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaErrors { errors })
    }
}

fn validate_scene_into(scene: &Scene, base: &[SchemaPathElem], errors: &mut Vec<SchemaError>) {
    let mut ids = HashSet::<&str>::new();
    for (i, node) in scene.nodes.iter().enumerate() {
        let mut path = base.to_vec();
        path.push(SchemaPathElem::Field("nodes"));
        path.push(SchemaPathElem::Index(i));

        if node.id.is_empty() {
            path.push(SchemaPathElem::Field("id"));
            errors.push(SchemaError::at(&path, "node id must be non-empty"));
            continue;
        }
        if !ids.insert(node.id.as_str()) {
            path.push(SchemaPathElem::Field("id"));
            errors.push(SchemaError::at(
                &path,
                format!("duplicate node id \"{}\"", node.id),
            ));
            continue;
        }
        // Unknown kinds are reported by the engine when reached, not here.
        if matches!(node.kind, NodeKind::Event | NodeKind::App) && node.keyword().is_empty() {
            path.push(SchemaPathElem::Field("data"));
            path.push(SchemaPathElem::Field("keyword"));
            errors.push(SchemaError::at(
                &path,
                format!("{} node \"{}\" must declare a keyword", node.kind.as_str(), node.id),
            ));
        }
    }

    for (i, edge) in scene.edges.iter().enumerate() {
        let mut path = base.to_vec();
        path.push(SchemaPathElem::Field("edges"));
        path.push(SchemaPathElem::Index(i));

        for (field, id) in [("source", &edge.source), ("target", &edge.target)] {
            if !ids.contains(id.as_str()) {
                let mut p = path.clone();
                p.push(SchemaPathElem::Field(field));
                errors.push(SchemaError::at(
                    &p,
                    format!("edge \"{}\" references unknown node \"{id}\"", edge.id),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/validate.rs"]
mod tests;
