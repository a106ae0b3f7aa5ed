//! The component tree (RFC 5545 §3.4-3.6).

use super::Property;

/// Components the importer looks inside.
///
/// VTODO, VJOURNAL, VFREEBUSY and X- components read as `Unknown`; their
/// name stays on [`Component::name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Calendar,
    Event,
    Timezone,
    Alarm,
    /// STANDARD observance of a VTIMEZONE.
    Standard,
    /// DAYLIGHT observance of a VTIMEZONE.
    Daylight,
    Unknown,
}

const COMPONENT_NAMES: [(ComponentKind, &str); 6] = [
    (ComponentKind::Calendar, "VCALENDAR"),
    (ComponentKind::Event, "VEVENT"),
    (ComponentKind::Timezone, "VTIMEZONE"),
    (ComponentKind::Alarm, "VALARM"),
    (ComponentKind::Standard, "STANDARD"),
    (ComponentKind::Daylight, "DAYLIGHT"),
];

impl ComponentKind {
    /// Kind for a `BEGIN:` name, ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        COMPONENT_NAMES
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map_or(Self::Unknown, |(kind, _)| *kind)
    }
}

/// A `BEGIN:`/`END:` block with its properties and nested blocks, both in
/// document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Uppercased name from the `BEGIN:` line.
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Component>,
}

impl Component {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        Self {
            kind: ComponentKind::parse(&name),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    /// First property called `name`, ignoring case.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.get_properties(name).next()
    }

    /// Repeated properties such as EXDATE, RDATE and CATEGORIES.
    pub fn get_properties<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a Property> + use<'a, 'n> {
        self.properties
            .iter()
            .filter(move |prop| prop.name.eq_ignore_ascii_case(name))
    }

    /// Unescaped text of the first `name` property.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get_property(name)?.as_text()
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.text("UID")
    }

    pub fn children_of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.children.iter().filter(move |child| child.kind == kind)
    }

    #[must_use]
    pub fn alarms(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Alarm).collect()
    }
}

/// A parsed calendar; `root` is its VCALENDAR.
#[derive(Debug, Clone, PartialEq)]
pub struct ICalendar {
    pub root: Component,
}

impl ICalendar {
    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Event).collect()
    }

    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Timezone).collect()
    }
}
