use phf::{Map, phf_map};

/// Static data for one chemical element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub number: u8,
    pub symbol: &'static str,
    pub name: &'static str,
    /// Standard atomic weight (natural isotopic mix), in Dalton.
    pub mass: f64,
}

const fn element(number: u8, symbol: &'static str, name: &'static str, mass: f64) -> Element {
    Element {
        number,
        symbol,
        name,
        mass,
    }
}

static ELEMENTS: &[Element] = &[
    element(1, "H", "Hydrogen", 1.008),
    element(2, "He", "Helium", 4.0026),
    element(3, "Li", "Lithium", 6.94),
    element(4, "Be", "Beryllium", 9.0122),
    element(5, "B", "Boron", 10.81),
    element(6, "C", "Carbon", 12.011),
    element(7, "N", "Nitrogen", 14.007),
    element(8, "O", "Oxygen", 15.999),
    element(9, "F", "Fluorine", 18.998),
    element(10, "Ne", "Neon", 20.180),
    element(11, "Na", "Sodium", 22.990),
    element(12, "Mg", "Magnesium", 24.305),
    element(13, "Al", "Aluminium", 26.982),
    element(14, "Si", "Silicon", 28.085),
    element(15, "P", "Phosphorus", 30.974),
    element(16, "S", "Sulfur", 32.06),
    element(17, "Cl", "Chlorine", 35.45),
    element(18, "Ar", "Argon", 39.948),
    element(19, "K", "Potassium", 39.098),
    element(20, "Ca", "Calcium", 40.078),
    element(21, "Sc", "Scandium", 44.956),
    element(22, "Ti", "Titanium", 47.867),
    element(23, "V", "Vanadium", 50.942),
    element(24, "Cr", "Chromium", 51.996),
    element(25, "Mn", "Manganese", 54.938),
    element(26, "Fe", "Iron", 55.845),
    element(27, "Co", "Cobalt", 58.933),
    element(28, "Ni", "Nickel", 58.693),
    element(29, "Cu", "Copper", 63.546),
    element(30, "Zn", "Zinc", 65.38),
    element(31, "Ga", "Gallium", 69.723),
    element(32, "Ge", "Germanium", 72.630),
    element(33, "As", "Arsenic", 74.922),
    element(34, "Se", "Selenium", 78.971),
    element(35, "Br", "Bromine", 79.904),
    element(36, "Kr", "Krypton", 83.798),
    element(37, "Rb", "Rubidium", 85.468),
    element(38, "Sr", "Strontium", 87.62),
    element(39, "Y", "Yttrium", 88.906),
    element(40, "Zr", "Zirconium", 91.224),
    element(41, "Nb", "Niobium", 92.906),
    element(42, "Mo", "Molybdenum", 95.95),
    element(43, "Tc", "Technetium", 98.0),
    element(44, "Ru", "Ruthenium", 101.07),
    element(45, "Rh", "Rhodium", 102.91),
    element(46, "Pd", "Palladium", 106.42),
    element(47, "Ag", "Silver", 107.87),
    element(48, "Cd", "Cadmium", 112.41),
    element(49, "In", "Indium", 114.82),
    element(50, "Sn", "Tin", 118.71),
    element(51, "Sb", "Antimony", 121.76),
    element(52, "Te", "Tellurium", 127.60),
    element(53, "I", "Iodine", 126.90),
    element(54, "Xe", "Xenon", 131.29),
    element(55, "Cs", "Caesium", 132.91),
    element(56, "Ba", "Barium", 137.33),
    element(57, "La", "Lanthanum", 138.91),
    element(74, "W", "Tungsten", 183.84),
    element(76, "Os", "Osmium", 190.23),
    element(77, "Ir", "Iridium", 192.22),
    element(78, "Pt", "Platinum", 195.08),
    element(79, "Au", "Gold", 196.97),
    element(80, "Hg", "Mercury", 200.59),
    element(81, "Tl", "Thallium", 204.38),
    element(82, "Pb", "Lead", 207.2),
    element(83, "Bi", "Bismuth", 208.98),
    element(92, "U", "Uranium", 238.03),
];

static SYMBOL_INDEX: Map<&'static str, usize> = phf_map! {
    "H" => 0, "He" => 1, "Li" => 2, "Be" => 3, "B" => 4, "C" => 5, "N" => 6, "O" => 7,
    "F" => 8, "Ne" => 9, "Na" => 10, "Mg" => 11, "Al" => 12, "Si" => 13, "P" => 14,
    "S" => 15, "Cl" => 16, "Ar" => 17, "K" => 18, "Ca" => 19, "Sc" => 20, "Ti" => 21,
    "V" => 22, "Cr" => 23, "Mn" => 24, "Fe" => 25, "Co" => 26, "Ni" => 27, "Cu" => 28,
    "Zn" => 29, "Ga" => 30, "Ge" => 31, "As" => 32, "Se" => 33, "Br" => 34, "Kr" => 35,
    "Rb" => 36, "Sr" => 37, "Y" => 38, "Zr" => 39, "Nb" => 40, "Mo" => 41, "Tc" => 42,
    "Ru" => 43, "Rh" => 44, "Pd" => 45, "Ag" => 46, "Cd" => 47, "In" => 48, "Sn" => 49,
    "Sb" => 50, "Te" => 51, "I" => 52, "Xe" => 53, "Cs" => 54, "Ba" => 55, "La" => 56,
    "W" => 57, "Os" => 58, "Ir" => 59, "Pt" => 60, "Au" => 61, "Hg" => 62, "Tl" => 63,
    "Pb" => 64, "Bi" => 65, "U" => 66,
};

/// Looks up an element by symbol, ignoring case (`"CL"`, `"cl"` and `"Cl"`
/// all resolve to chlorine).
pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    let symbol = symbol.trim();
    let mut chars = symbol.chars();
    let first = chars.next()?;
    let normalized: String = first
        .to_uppercase()
        .chain(chars.flat_map(char::to_lowercase))
        .collect();
    SYMBOL_INDEX
        .get(normalized.as_str())
        .map(|&index| &ELEMENTS[index])
}

pub fn by_number(number: u8) -> Option<&'static Element> {
    ELEMENTS.iter().find(|element| element.number == number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_index_points_at_matching_entries() {
        for (symbol, &index) in SYMBOL_INDEX.entries() {
            assert_eq!(ELEMENTS[index].symbol, *symbol);
        }
        assert_eq!(SYMBOL_INDEX.len(), ELEMENTS.len());
    }

    #[test]
    fn by_symbol_is_case_insensitive() {
        assert_eq!(by_symbol("cl").map(|e| e.number), Some(17));
        assert_eq!(by_symbol("CL").map(|e| e.number), Some(17));
        assert_eq!(by_symbol(" Fe ").map(|e| e.name), Some("Iron"));
    }

    #[test]
    fn by_symbol_rejects_unknown_and_empty() {
        assert!(by_symbol("").is_none());
        assert!(by_symbol("Xx").is_none());
        assert!(by_symbol("CA1").is_none());
    }

    #[test]
    fn by_number_finds_sparse_entries() {
        assert_eq!(by_number(6).map(|e| e.symbol), Some("C"));
        assert_eq!(by_number(92).map(|e| e.symbol), Some("U"));
        assert!(by_number(0).is_none());
        assert!(by_number(60).is_none());
    }
}
