use std::fmt;

/// Depth of a catalog node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Project,
    Service,
    Module,
    Method,
}

impl Level {
    /// Number of path segments needed to address a node at this level.
    pub fn depth(self) -> usize {
        match self {
            Level::Project => 1,
            Level::Service => 2,
            Level::Module => 3,
            Level::Method => 4,
        }
    }

    fn from_depth(depth: usize) -> Option<Level> {
        match depth {
            1 => Some(Level::Project),
            2 => Some(Level::Service),
            3 => Some(Level::Module),
            4 => Some(Level::Method),
            _ => None,
        }
    }

    /// Level of the nodes directly beneath this one.
    pub fn child(self) -> Option<Level> {
        Level::from_depth(self.depth() + 1)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Project => "project",
            Level::Service => "service",
            Level::Module => "module",
            Level::Method => "method",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full address of a catalog node: one to four names, root first.
///
/// The node's level is the number of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    /// Returns `None` unless there are between one and four segments.
    pub fn new<I, S>(segments: I) -> Option<NodePath>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        Level::from_depth(segments.len())?;
        Some(NodePath { segments })
    }

    pub fn project(name: impl Into<String>) -> NodePath {
        NodePath {
            segments: vec![name.into()],
        }
    }

    pub fn level(&self) -> Level {
        // Construction guarantees 1..=4 segments.
        Level::from_depth(self.segments.len()).unwrap_or(Level::Method)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The node's own name (its last segment).
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path of a child named `name`, or `None` below a method.
    pub fn child(&self, name: impl Into<String>) -> Option<NodePath> {
        self.level().child()?;
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Some(NodePath { segments })
    }

    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(NodePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Copy of this path with the segment at `level` replaced.
    ///
    /// Paths shallower than `level` are returned unchanged.
    pub fn with_segment(&self, level: Level, name: &str) -> NodePath {
        let mut segments = self.segments.clone();
        if let Some(slot) = segments.get_mut(level.depth() - 1) {
            *slot = name.to_string();
        }
        NodePath { segments }
    }

    pub fn as_method(&self) -> Option<MethodPath> {
        match self.segments.as_slice() {
            [project, service, module, method] => Some(MethodPath::new(
                project.clone(),
                service.clone(),
                module.clone(),
                method.clone(),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl From<MethodPath> for NodePath {
    fn from(path: MethodPath) -> Self {
        NodePath {
            segments: vec![path.project, path.service, path.module, path.method],
        }
    }
}

/// Address of a method leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodPath {
    pub project: String,
    pub service: String,
    pub module: String,
    pub method: String,
}

impl MethodPath {
    pub fn new(
        project: impl Into<String>,
        service: impl Into<String>,
        module: impl Into<String>,
        method: impl Into<String>,
    ) -> MethodPath {
        MethodPath {
            project: project.into(),
            service: service.into(),
            module: module.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.project, self.service, self.module, self.method
        )
    }
}
