//! Reading back exported cross-section documents
mod parsers;

// standard library
use std::fs;
use std::path::Path;
use std::str::FromStr;

// mgtools modules
use mgtools_utils::f;

// crate modules
use crate::document::{Element, DEPLETION_ROOT, MACROSCOPIC_ROOT};
use crate::domain::DomainKind;
use crate::error::{Error, Result};
use crate::reaction::ReactionType;

// external crates
use log::{info, trace};
use nom::combinator::all_consuming;

/// Which of the two document layouts was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `macroscopic_cross_sections` for transport
    Macroscopic,
    /// `depletion_chain` with per-nuclide channels
    Depletion,
}

/// A single `reaction` element
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionNode {
    /// Value of the `type` attribute, e.g. `total` or `scatter`
    pub reaction_type: String,
    /// Every value of the `mgxs` attribute in file order
    pub values: Vec<f64>,
}

/// A `nuclide` element from a depletion document
#[derive(Debug, Clone, PartialEq)]
pub struct NuclideNode {
    /// Nuclide name
    pub name: String,
    /// Reaction channels in file order
    pub reactions: Vec<ReactionNode>,
}

impl NuclideNode {
    /// Values for a reaction channel, if present
    pub fn reaction(&self, reaction: ReactionType) -> Option<&[f64]> {
        find_reaction(&self.reactions, reaction)
    }
}

/// A `domain` element
#[derive(Debug, Clone, PartialEq)]
pub struct DomainNode {
    /// Type of region
    pub kind: DomainKind,
    /// Name given at export
    pub name: String,
    /// Identifier the solver selects by
    pub id: u32,
    /// Legendre order of the scattering matrix, if there is one
    pub num_legendre: Option<u32>,
    /// Macroscopic reactions in file order
    pub reactions: Vec<ReactionNode>,
    /// Nuclides in file order, depletion documents only
    pub nuclides: Vec<NuclideNode>,
}

impl DomainNode {
    /// Values for a reaction, if present
    ///
    /// Any scatter variant finds the single `scatter` entry.
    pub fn reaction(&self, reaction: ReactionType) -> Option<&[f64]> {
        find_reaction(&self.reactions, reaction)
    }

    /// Find a nuclide by name
    pub fn nuclide(&self, name: &str) -> Option<&NuclideNode> {
        self.nuclides.iter().find(|n| n.name == name)
    }
}

/// Contents of an exported cross-section document
///
/// This is what the solver sees, so is mostly useful for checking exported
/// files.
///
/// ```rust
/// # use mgtools_mgxs::{DocumentKind, ReactionType, XsDocument};
/// let text = r#"<?xml version='1.0' encoding='utf-8'?>
/// <macroscopic_cross_sections generator="openmc" num_groups="1" group_bounds="20000000.0 0.0" energy_units="eV" xs_units="cm^-1">
///   <domain type="material" name="fuel" id="1" num_legendre="0">
///     <reaction type="total" mgxs="1.5"/>
///     <reaction type="scatter" mgxs="0.5"/>
///   </domain>
/// </macroscopic_cross_sections>
/// "#;
/// let document: XsDocument = text.parse().unwrap();
/// assert_eq!(document.kind, DocumentKind::Macroscopic);
///
/// let fuel = document.domain(1).unwrap();
/// assert_eq!(fuel.reaction(ReactionType::Total), Some([1.5].as_slice()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct XsDocument {
    /// Layout of the document
    pub kind: DocumentKind,
    /// Generator tag
    pub generator: String,
    /// Number of energy groups
    pub num_groups: usize,
    /// Group boundaries as written, i.e. in group order
    pub group_bounds: Vec<f64>,
    /// Units of the group boundaries
    pub energy_units: String,
    /// Units of the cross sections
    pub xs_units: String,
    /// Domains in file order
    pub domains: Vec<DomainNode>,
}

impl XsDocument {
    /// Find a domain by id
    pub fn domain(&self, id: u32) -> Option<&DomainNode> {
        self.domains.iter().find(|d| d.id == id)
    }
}

impl FromStr for XsDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (_, root) = all_consuming(parsers::document)(s)?;
        trace!("Parsed <{}> with {} children", root.tag(), root.children().len());
        XsDocument::try_from(&root)
    }
}

impl TryFrom<&Element> for XsDocument {
    type Error = Error;

    fn try_from(root: &Element) -> Result<Self> {
        let kind = match root.tag() {
            MACROSCOPIC_ROOT => DocumentKind::Macroscopic,
            DEPLETION_ROOT => DocumentKind::Depletion,
            other => return Err(Error::Parse(f!("unknown root element <{other}>"))),
        };

        let num_groups: usize = parse_integer(root, "num_groups")?;
        let group_bounds = parse_values(root, "group_bounds")?;
        if group_bounds.len() != num_groups + 1 {
            return Err(Error::Parse(f!(
                "{num_groups} groups but {} boundaries",
                group_bounds.len()
            )));
        }

        let domains = root
            .children()
            .iter()
            .map(domain_node)
            .collect::<Result<Vec<DomainNode>>>()?;

        Ok(Self {
            kind,
            generator: required(root, "generator")?.to_string(),
            num_groups,
            group_bounds,
            energy_units: required(root, "energy_units")?.to_string(),
            xs_units: required(root, "xs_units")?.to_string(),
            domains,
        })
    }
}

/// Read an exported cross-section document
///
/// ```rust, no_run
/// # use mgtools_mgxs::read_xml;
/// let document = read_xml("xs/macro_xs.xml").unwrap();
/// println!("{} domains", document.domains.len());
/// ```
pub fn read_xml<P: AsRef<Path>>(path: P) -> Result<XsDocument> {
    let path: &Path = path.as_ref();
    info!("Reading {}", path.display());
    fs::read_to_string(path)?.parse()
}

fn domain_node(element: &Element) -> Result<DomainNode> {
    expect_tag(element, "domain")?;

    let mut reactions = Vec::new();
    let mut nuclides = Vec::new();
    for child in element.children() {
        match child.tag() {
            "reaction" => reactions.push(reaction_node(child)?),
            "nuclide" => nuclides.push(nuclide_node(child)?),
            other => return Err(Error::Parse(f!("unexpected <{other}> in domain"))),
        }
    }

    let num_legendre = match element.attribute("num_legendre") {
        Some(_) => Some(parse_integer(element, "num_legendre")?),
        None => None,
    };

    let kind = required(element, "type")?;
    let kind = kind
        .parse::<DomainKind>()
        .map_err(|_| Error::Parse(f!("unknown domain type \"{kind}\"")))?;

    Ok(DomainNode {
        kind,
        name: required(element, "name")?.to_string(),
        id: parse_integer(element, "id")?,
        num_legendre,
        reactions,
        nuclides,
    })
}

fn nuclide_node(element: &Element) -> Result<NuclideNode> {
    let name = required(element, "name")?.to_string();
    let declared: usize = parse_integer(element, "reactions")?;
    let reactions = element
        .children()
        .iter()
        .map(reaction_node)
        .collect::<Result<Vec<ReactionNode>>>()?;

    if reactions.len() != declared {
        return Err(Error::Parse(f!(
            "nuclide {name} declares {declared} reactions but has {}",
            reactions.len()
        )));
    }

    Ok(NuclideNode { name, reactions })
}

fn reaction_node(element: &Element) -> Result<ReactionNode> {
    expect_tag(element, "reaction")?;
    Ok(ReactionNode {
        reaction_type: required(element, "type")?.to_string(),
        values: parse_values(element, "mgxs")?,
    })
}

fn find_reaction(reactions: &[ReactionNode], reaction: ReactionType) -> Option<&[f64]> {
    reactions
        .iter()
        .find(|r| r.reaction_type == reaction.export_name())
        .map(|r| r.values.as_slice())
}

fn expect_tag(element: &Element, tag: &str) -> Result<()> {
    if element.tag() != tag {
        return Err(Error::Parse(f!(
            "expected <{tag}>, found <{}>",
            element.tag()
        )));
    }
    Ok(())
}

fn required<'a>(element: &'a Element, key: &str) -> Result<&'a str> {
    element
        .attribute(key)
        .ok_or_else(|| Error::Parse(f!("<{}> has no \"{key}\" attribute", element.tag())))
}

fn parse_integer<T: FromStr>(element: &Element, key: &str) -> Result<T> {
    let value = required(element, key)?;
    value
        .trim()
        .parse()
        .map_err(|_| Error::Parse(f!("invalid integer \"{value}\" for \"{key}\"")))
}

fn parse_values(element: &Element, key: &str) -> Result<Vec<f64>> {
    let value = required(element, key)?;
    let (_, values) = all_consuming(parsers::vector_of_f64)(value)?;
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLETION: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<depletion_chain generator="openmc" num_groups="2" group_bounds="20000000.0 0.625 0.0" energy_units="eV" xs_units="barns">
  <domain type="cell" name="pin &amp; clad" id="4">
    <nuclide name="U235" reactions="1">
      <reaction type="(n,gamma)" mgxs="0.5 80.0"/>
    </nuclide>
    <nuclide name="O16" reactions="0"/>
  </domain>
</depletion_chain>
"#;

    #[test]
    fn depletion_document() {
        let document: XsDocument = DEPLETION.parse().unwrap();
        assert_eq!(document.kind, DocumentKind::Depletion);
        assert_eq!(document.xs_units, "barns");
        assert_eq!(document.group_bounds, vec![2e7, 0.625, 0.0]);

        let pin = document.domain(4).unwrap();
        assert_eq!(pin.kind, DomainKind::Cell);
        assert_eq!(pin.name, "pin & clad");
        assert_eq!(pin.num_legendre, None);

        let u235 = pin.nuclide("U235").unwrap();
        assert_eq!(u235.reaction(ReactionType::NGamma), Some([0.5, 80.0].as_slice()));
        assert_eq!(u235.reaction(ReactionType::N2n), None);
        assert!(pin.nuclide("O16").unwrap().reactions.is_empty());
    }

    #[test]
    fn inconsistent_documents() {
        let bad_count = DEPLETION.replace("reactions=\"1\"", "reactions=\"2\"");
        assert!(matches!(bad_count.parse::<XsDocument>(), Err(Error::Parse(_))));

        let bad_groups = DEPLETION.replace("num_groups=\"2\"", "num_groups=\"3\"");
        assert!(matches!(bad_groups.parse::<XsDocument>(), Err(Error::Parse(_))));

        let bad_value = DEPLETION.replace("80.0", "eighty");
        assert!(matches!(bad_value.parse::<XsDocument>(), Err(Error::Parse(_))));

        let joined = DEPLETION.replace("0.5 80.0", "0.580.0");
        assert!(matches!(joined.parse::<XsDocument>(), Err(Error::Parse(_))));

        let bad_kind = DEPLETION.replace("type=\"cell\"", "type=\"lattice\"");
        assert!(matches!(bad_kind.parse::<XsDocument>(), Err(Error::Parse(_))));

        let bad_root = DEPLETION.replace("depletion_chain", "chain");
        assert!(matches!(bad_root.parse::<XsDocument>(), Err(Error::Parse(_))));

        let truncated = &DEPLETION[..DEPLETION.len() - 20];
        assert!(matches!(truncated.parse::<XsDocument>(), Err(Error::Parse(_))));
    }
}
