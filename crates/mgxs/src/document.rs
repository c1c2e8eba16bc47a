//! In-memory XML documents in the layout the solver reads

// mgtools modules
use mgtools_utils::{f, SliceExt};

// crate modules
use crate::error::{Error, Result};
use crate::library::{DomainXs, MgxsLibrary, NuclideXs};
use crate::reaction::{ReactionRecord, ReactionType, XsData};

// external crates
use log::debug;

/// Declaration written at the top of every document
pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>";

/// Root tag of a transport cross-section document
pub const MACROSCOPIC_ROOT: &str = "macroscopic_cross_sections";

/// Root tag of a depletion cross-section document
pub const DEPLETION_ROOT: &str = "depletion_chain";

/// A single XML element with ordered attributes
///
/// Only the small subset of XML needed for cross-section documents is
/// supported, i.e. no text content, comments, or namespaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
}

impl Element {
    /// Create an empty element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute, keeping insertion order
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    /// Append a child element
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Element tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Raw (unescaped) attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in insertion order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Child elements in insertion order
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub(crate) fn from_parts(
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<Element>,
    ) -> Self {
        Self {
            tag,
            attributes,
            children,
        }
    }

    fn write_into(&self, s: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        s.push_str(&indent);
        s.push('<');
        s.push_str(&self.tag);
        for (key, value) in &self.attributes {
            s.push_str(&f!(" {key}=\"{}\"", escape(value)));
        }

        if self.children.is_empty() {
            s.push_str("/>\n");
            return;
        }

        s.push_str(">\n");
        for child in &self.children {
            child.write_into(s, depth + 1);
        }
        s.push_str(&f!("{indent}</{}>\n", self.tag));
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = String::new();
        self.write_into(&mut s, 0);
        write!(f, "{}", s.trim_end())
    }
}

/// Escape the characters that cannot appear in a quoted attribute value
pub(crate) fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Complete cross-section document, ready to be written
///
/// Documents are always built in full before anything touches the disk, so
/// any validation failure leaves existing files alone.
///
/// ```rust
/// # use mgtools_mgxs::{Domain, DomainXs, EnergyGroups, ExportDocument, MgxsLibrary};
/// # use mgtools_mgxs::{ReactionRecord, ReactionType, ScatterKind, ScatterMatrix};
/// let groups = EnergyGroups::new(vec![0.0, 0.625, 2e7]).unwrap();
/// let mut library = MgxsLibrary::new(groups);
/// let scatter = ScatterMatrix::legendre(2, 0, vec![0.5, 0.1, 0.0, 1.5]).unwrap();
/// let fuel = DomainXs::new(Domain::material(1, "fuel"))
///     .with_record(ReactionRecord::groupwise(ReactionType::Total, vec![1.0, 2.0]).unwrap())
///     .with_record(ReactionRecord::scatter(ScatterKind::NuScatter, scatter).unwrap());
/// library.push(fuel).unwrap();
///
/// let document = ExportDocument::macroscopic(&library, "openmc").unwrap();
/// assert!(document.to_string().contains(r#"<reaction type="scatter" mgxs="0.5 0.1 0.0 1.5"/>"#));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    root: Element,
}

impl ExportDocument {
    /// Build a transport document with macroscopic cross sections
    ///
    /// Every domain must have a total cross section and a scattering matrix
    /// in a Legendre representation. Reactions are written in the order they
    /// appear in each domain.
    pub fn macroscopic(library: &MgxsLibrary, generator: &str) -> Result<Self> {
        let mut root = root_element(MACROSCOPIC_ROOT, library, generator, "cm^-1");
        for domain in library.domains() {
            root.push(macroscopic_domain(domain)?);
        }
        Ok(Self { root })
    }

    /// Build a depletion document with per-nuclide microscopic channels
    ///
    /// Channels that are zero everywhere are left out, and each nuclide
    /// records how many reactions were kept.
    pub fn depletion(library: &MgxsLibrary, generator: &str) -> Result<Self> {
        let mut root = root_element(DEPLETION_ROOT, library, generator, "barns");
        for domain in library.domains() {
            let mut element = domain_element(domain);
            for nuclide in &domain.nuclides {
                element.push(nuclide_element(domain, nuclide));
            }
            root.push(element);
        }
        Ok(Self { root })
    }

    /// Root element of the document
    pub fn root(&self) -> &Element {
        &self.root
    }
}

impl std::fmt::Display for ExportDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut s = f!("{XML_DECLARATION}\n");
        self.root.write_into(&mut s, 0);
        write!(f, "{}", s)
    }
}

fn root_element(tag: &str, library: &MgxsLibrary, generator: &str, units: &str) -> Element {
    let groups = library.groups();
    Element::new(tag)
        .with_attribute("generator", generator)
        .with_attribute("num_groups", groups.num_groups())
        .with_attribute("group_bounds", groups.group_bounds())
        .with_attribute("energy_units", "eV")
        .with_attribute("xs_units", units)
}

fn domain_element(domain: &DomainXs) -> Element {
    Element::new("domain")
        .with_attribute("type", domain.domain.kind)
        .with_attribute("name", &domain.domain.name)
        .with_attribute("id", domain.domain.id)
}

fn macroscopic_domain(domain: &DomainXs) -> Result<Element> {
    let missing = |reaction: &str| Error::MissingData {
        domain: domain.domain.name.clone(),
        reaction: reaction.to_string(),
    };
    domain
        .get(ReactionType::Total)
        .ok_or_else(|| missing(ReactionType::Total.name()))?;
    let scatter = domain.scatter().ok_or_else(|| missing("scatter"))?;

    let mut element = domain_element(domain);
    if let XsData::Scatter(matrix) = scatter.data() {
        element = element.with_attribute("num_legendre", matrix.legendre_order()?);
    }

    for record in &domain.records {
        if let XsData::Scatter(matrix) = record.data() {
            // every matrix has to be flattened in moments
            matrix.legendre_order()?;
        }
        element.push(reaction_element(record));
    }

    Ok(element)
}

fn nuclide_element(domain: &DomainXs, nuclide: &NuclideXs) -> Element {
    let (kept, skipped): (Vec<&ReactionRecord>, Vec<&ReactionRecord>) = nuclide
        .records
        .iter()
        .partition(|r| !r.data().is_degenerate());

    for record in skipped {
        debug!(
            "Skipping {} for {} in {}, all values are zero",
            record.reaction(),
            nuclide.name,
            domain.domain
        );
    }

    let mut element = Element::new("nuclide")
        .with_attribute("name", &nuclide.name)
        .with_attribute("reactions", kept.len());
    for record in kept {
        element.push(reaction_element(record));
    }
    element
}

fn reaction_element(record: &ReactionRecord) -> Element {
    Element::new("reaction")
        .with_attribute("type", record.reaction().export_name())
        .with_attribute("mgxs", record.data().values().to_spaced_string())
}
