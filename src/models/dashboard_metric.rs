use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily aggregation point as served by the upstream `/dashboard/metrics`
/// endpoint. Only `calculation_date` is interpreted by the window cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_office_id: Option<i64>,
    #[serde(default, alias = "familleName")]
    pub famille: Option<String>,
    pub calculation_date: NaiveDate,
    #[serde(default)]
    pub montant_total_bc: Option<f64>,
    #[serde(default)]
    pub montant_cloture_terrain: Option<f64>,
    #[serde(default)]
    pub taux_realisation: Option<f64>,
    #[serde(default)]
    pub montant_receptionne_facture: Option<f64>,
    #[serde(default)]
    pub montant_depose_sys: Option<f64>,
    #[serde(default, alias = "montantADeposeSys")]
    pub montant_a_deposer_sys: Option<f64>,
    #[serde(default)]
    pub montant_en_cours_recep_tech: Option<f64>,
    #[serde(default)]
    pub montant_en_cours_recep_tech_reserve: Option<f64>,
    #[serde(default)]
    pub montant_restant_bc: Option<f64>,
    #[serde(default)]
    pub montant_travaux_en_cours: Option<f64>,
}

#[allow(dead_code)]
impl MetricSnapshot {
    /// Empty payload for a date. Mostly useful when building fixtures.
    pub fn on(calculation_date: NaiveDate) -> Self {
        Self {
            id: None,
            back_office_id: None,
            famille: None,
            calculation_date,
            montant_total_bc: None,
            montant_cloture_terrain: None,
            taux_realisation: None,
            montant_receptionne_facture: None,
            montant_depose_sys: None,
            montant_a_deposer_sys: None,
            montant_en_cours_recep_tech: None,
            montant_en_cours_recep_tech_reserve: None,
            montant_restant_bc: None,
            montant_travaux_en_cours: None,
        }
    }

    pub fn with_total_bc(mut self, montant: f64) -> Self {
        self.montant_total_bc = Some(montant);
        self
    }
}
