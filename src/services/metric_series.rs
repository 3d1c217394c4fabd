use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::MetricSnapshot;

/// Numeric fields of a snapshot that the trend chart can plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKey {
    MontantTotalBc,
    MontantClotureTerrain,
    TauxRealisation,
    MontantReceptionneFacture,
    MontantDeposeSys,
    MontantADeposerSys,
    MontantEnCoursRecepTech,
    MontantEnCoursRecepTechReserve,
    MontantRestantBc,
    MontantTravauxEnCours,
}

impl MetricKey {
    pub const ALL: [MetricKey; 10] = [
        MetricKey::MontantTotalBc,
        MetricKey::MontantClotureTerrain,
        MetricKey::TauxRealisation,
        MetricKey::MontantReceptionneFacture,
        MetricKey::MontantDeposeSys,
        MetricKey::MontantADeposerSys,
        MetricKey::MontantEnCoursRecepTech,
        MetricKey::MontantEnCoursRecepTechReserve,
        MetricKey::MontantRestantBc,
        MetricKey::MontantTravauxEnCours,
    ];

    /// Wire name, as in the snapshot JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::MontantTotalBc => "montantTotalBc",
            MetricKey::MontantClotureTerrain => "montantClotureTerrain",
            MetricKey::TauxRealisation => "tauxRealisation",
            MetricKey::MontantReceptionneFacture => "montantReceptionneFacture",
            MetricKey::MontantDeposeSys => "montantDeposeSys",
            MetricKey::MontantADeposerSys => "montantADeposerSys",
            MetricKey::MontantEnCoursRecepTech => "montantEnCoursRecepTech",
            MetricKey::MontantEnCoursRecepTechReserve => "montantEnCoursRecepTechReserve",
            MetricKey::MontantRestantBc => "montantRestantBc",
            MetricKey::MontantTravauxEnCours => "montantTravauxEnCours",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::MontantTotalBc => "Montant total BC",
            MetricKey::MontantClotureTerrain => "Montant clôturé terrain",
            MetricKey::TauxRealisation => "Taux de réalisation",
            MetricKey::MontantReceptionneFacture => "Montant réceptionné facturé",
            MetricKey::MontantDeposeSys => "Montant déposé système",
            MetricKey::MontantADeposerSys => "Montant à déposer système",
            MetricKey::MontantEnCoursRecepTech => "En cours réception technique",
            MetricKey::MontantEnCoursRecepTechReserve => "Réception technique avec réserve",
            MetricKey::MontantRestantBc => "Montant restant BC",
            MetricKey::MontantTravauxEnCours => "Travaux en cours",
        }
    }

    pub fn value(&self, snapshot: &MetricSnapshot) -> Option<f64> {
        match self {
            MetricKey::MontantTotalBc => snapshot.montant_total_bc,
            MetricKey::MontantClotureTerrain => snapshot.montant_cloture_terrain,
            MetricKey::TauxRealisation => snapshot.taux_realisation,
            MetricKey::MontantReceptionneFacture => snapshot.montant_receptionne_facture,
            MetricKey::MontantDeposeSys => snapshot.montant_depose_sys,
            MetricKey::MontantADeposerSys => snapshot.montant_a_deposer_sys,
            MetricKey::MontantEnCoursRecepTech => snapshot.montant_en_cours_recep_tech,
            MetricKey::MontantEnCoursRecepTechReserve => {
                snapshot.montant_en_cours_recep_tech_reserve
            }
            MetricKey::MontantRestantBc => snapshot.montant_restant_bc,
            MetricKey::MontantTravauxEnCours => snapshot.montant_travaux_en_cours,
        }
    }

    /// Comma-separated keys; blank means every key.
    pub fn parse_list(raw: Option<&str>) -> Result<Vec<MetricKey>, AppError> {
        let keys: Vec<MetricKey> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(MetricKey::from_str)
            .collect::<Result<_, _>>()?;

        if keys.is_empty() {
            Ok(MetricKey::ALL.to_vec())
        } else {
            Ok(keys)
        }
    }
}

impl FromStr for MetricKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown metric key: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: NaiveDate,
    /// Short axis label, e.g. "Jan 5".
    pub label: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub key: &'static str,
    pub label: &'static str,
    pub points: Vec<SeriesPoint>,
}

pub fn project_series(points: &[MetricSnapshot], keys: &[MetricKey]) -> Vec<ChartSeries> {
    keys.iter()
        .map(|key| ChartSeries {
            key: key.as_str(),
            label: key.label(),
            points: points
                .iter()
                .map(|snapshot| SeriesPoint {
                    date: snapshot.calculation_date,
                    label: snapshot.calculation_date.format("%b %-d").to_string(),
                    value: key.value(snapshot),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    #[test]
    fn test_parse_list_defaults_to_all() {
        assert_eq!(MetricKey::parse_list(None).unwrap().len(), 10);
        assert_eq!(MetricKey::parse_list(Some(" , ")).unwrap().len(), 10);
    }

    #[test]
    fn test_parse_list_keeps_order() {
        let keys = MetricKey::parse_list(Some("tauxRealisation, montantTotalBc")).unwrap();
        assert_eq!(keys, vec![MetricKey::TauxRealisation, MetricKey::MontantTotalBc]);
    }

    #[test]
    fn test_parse_list_rejects_unknown_key() {
        assert!(matches!(
            MetricKey::parse_list(Some("montantTotalBc,bogus")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_every_key_round_trips_its_name() {
        for key in MetricKey::ALL {
            assert_eq!(key.as_str().parse::<MetricKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_project_series_follows_window_order() {
        let points = vec![
            MetricSnapshot::on(day(4)).with_total_bc(100.0),
            MetricSnapshot::on(day(5)),
            MetricSnapshot::on(day(6)).with_total_bc(140.0),
        ];

        let series = project_series(&points, &[MetricKey::MontantTotalBc]);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].key, "montantTotalBc");
        let values: Vec<_> = series[0].points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(100.0), None, Some(140.0)]);
        assert_eq!(series[0].points[0].label, "Jan 4");
        assert_eq!(series[0].points[2].date, day(6));
    }

    #[test]
    fn test_project_series_on_empty_window() {
        let series = project_series(&[], &MetricKey::ALL);
        assert_eq!(series.len(), 10);
        assert!(series.iter().all(|s| s.points.is_empty()));
    }
}
