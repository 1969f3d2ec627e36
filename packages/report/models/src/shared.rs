//! Enumerations shared by more than one domain.

catalog_enum! {
    /// Severity of observed damage or of a violation.
    pub enum DamageLevel as "damage_level" {
        /// Light damage
        Ringan = ["LIGHT", "MINOR", "RUSAK_RINGAN"],
        /// Moderate damage
        Sedang = ["MODERATE", "MEDIUM", "RUSAK_SEDANG"],
        /// Severe damage
        Berat = ["SEVERE", "HEAVY", "RUSAK_BERAT"],
    }
}

catalog_enum! {
    /// Urgency flag used by water and spatial reports.
    pub enum Urgency as "urgency" {
        /// Handled in the regular schedule
        Normal = ["ROUTINE", "BIASA"],
        /// Needs immediate handling
        Mendesak = ["URGENT"],
    }
}

catalog_enum! {
    /// Qualitative impact level.
    pub enum ImpactLevel as "environmental_impact" {
        /// Low impact
        Rendah = ["LOW"],
        /// Medium impact
        Sedang = ["MEDIUM", "MODERATE"],
        /// High impact
        Tinggi = ["HIGH"],
    }
}
