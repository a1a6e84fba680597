// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OData service and metadata documents.

use crate::models::{EdmType, ACTIVITY_COLUMNS, KEY_COLUMN};
use serde::Serialize;

/// CSDL metadata for the fixed sample feed.
pub const SAMPLE_METADATA_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
  <edmx:DataServices>
    <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="SampleDataService">
      <EntityType Name="SampleDataItem">
        <Key>
          <PropertyRef Name="Date"/>
        </Key>
        <Property Name="Date" Type="Edm.String" Nullable="false"/>
        <Property Name="Value" Type="Edm.Int32" Nullable="false"/>
      </EntityType>
      <EntityContainer Name="Container">
        <EntitySet Name="SampleData" EntityType="SampleDataService.SampleDataItem"/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

/// CSDL metadata for the activity feed, generated from the column schema.
pub fn activity_metadata_xml() -> String {
    let key = ACTIVITY_COLUMNS
        .iter()
        .find(|c| c.source == KEY_COLUMN)
        .map(|c| c.odata)
        .unwrap_or("Date");

    let mut properties = String::new();
    for column in &ACTIVITY_COLUMNS {
        let nullable = if column.odata == key && column.edm == EdmType::String {
            r#" Nullable="false""#
        } else {
            ""
        };
        properties.push_str(&format!(
            "        <Property Name=\"{}\" Type=\"{}\"{}/>\n",
            column.odata,
            column.edm.as_str(),
            nullable
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
  <edmx:DataServices>
    <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="GarminActivitiesService">
      <EntityType Name="Activity">
        <Key>
          <PropertyRef Name="{key}"/>
        </Key>
{properties}      </EntityType>
      <EntityContainer Name="Container">
        <EntitySet Name="Activities" EntityType="GarminActivitiesService.Activity"/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#
    )
}

/// OData service document listing a single entity set.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDocument {
    #[serde(rename = "@odata.context")]
    pub context: String,
    pub value: Vec<EntitySetRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitySetRef {
    pub name: &'static str,
    pub kind: &'static str,
    pub url: &'static str,
}

impl ServiceDocument {
    /// `metadata_url` is the absolute `$metadata` URL of the feed.
    pub fn new(metadata_url: String, entity_set: &'static str, url: &'static str) -> Self {
        Self {
            context: metadata_url,
            value: vec![EntitySetRef {
                name: entity_set,
                kind: "EntitySet",
                url,
            }],
        }
    }
}
