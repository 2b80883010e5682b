//! Integration tests for the reachability closure
//!
//! These tests build small multi-file schema sets on disk and check that the
//! closure contains exactly what a manual walk of the references would find.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ndc_schema::{DefinitionKey, ReachabilityAnalyzer, SchemaGraphLoader};
use tempfile::TempDir;

const MSG: &str = "http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersMessage";
const CNS: &str = "http://www.iata.org/IATA/2015/EASD/00/IATA_OffersAndOrdersCommonTypes";
const DS: &str = "http://www.w3.org/2000/09/xmldsig#";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn fixture(dir: &Path) -> PathBuf {
    write(
        dir,
        "IATA_TestRQ.xsd",
        &format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="{MSG}" xmlns:cns="{CNS}"
           targetNamespace="{MSG}">
  <xs:import namespace="{CNS}" schemaLocation="common/CommonTypes.xsd"/>
  <xs:element name="IATA_TestRQ">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Payload" type="cns:PayloadType"/>
        <xs:element ref="cns:Missing"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#
        ),
    );
    fs::create_dir_all(dir.join("common")).unwrap();
    write(
        &dir.join("common"),
        "CommonTypes.xsd",
        &format!(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:c="{CNS}" xmlns:ds="{DS}"
            targetNamespace="{CNS}">
  <xsd:import namespace="{DS}" schemaLocation="xmldsig-core-schema.xsd"/>
  <xsd:complexType name="PayloadType">
    <xsd:complexContent>
      <xsd:extension base="c:BaseType">
        <xsd:sequence>
          <xsd:element name="Code" type="c:CodeListType"/>
          <xsd:element ref="ds:Signature"/>
        </xsd:sequence>
      </xsd:extension>
    </xsd:complexContent>
  </xsd:complexType>
  <xsd:complexType name="BaseType">
    <xsd:sequence>
      <xsd:element ref="c:Item"/>
    </xsd:sequence>
    <xsd:attributeGroup ref="c:CommonAttrs"/>
  </xsd:complexType>
  <xsd:element name="Item" type="c:ItemType" substitutionGroup="c:AbstractItem"/>
  <xsd:element name="AbstractItem" abstract="true"/>
  <xsd:complexType name="ItemType">
    <xsd:sequence>
      <xsd:element name="Child" type="c:PayloadType" minOccurs="0"/>
    </xsd:sequence>
  </xsd:complexType>
  <xsd:attributeGroup name="CommonAttrs">
    <xsd:attribute name="Tokens" type="c:TokenListType"/>
  </xsd:attributeGroup>
  <xsd:simpleType name="TokenListType"><xsd:list itemType="c:TokenType"/></xsd:simpleType>
  <xsd:simpleType name="TokenType"><xsd:restriction base="xsd:token"/></xsd:simpleType>
  <xsd:simpleType name="CodeListType"><xsd:union memberTypes="c:CodeA c:CodeB"/></xsd:simpleType>
  <xsd:simpleType name="CodeA"><xsd:restriction base="xsd:string"/></xsd:simpleType>
  <xsd:simpleType name="CodeB"><xsd:restriction base="xsd:string"/></xsd:simpleType>
  <xsd:complexType name="UnusedType"><xsd:sequence/></xsd:complexType>
  <xsd:group name="UnusedGroup"><xsd:sequence/></xsd:group>
</xsd:schema>"#
        ),
    )
}

fn keys(names: &[(&str, &str)]) -> BTreeSet<DefinitionKey> {
    names.iter().map(|(ns, name)| DefinitionKey::new(*ns, *name)).collect()
}

#[test]
fn closure_contains_exactly_the_reachable_definitions() {
    let dir = TempDir::new().unwrap();
    let main = fixture(dir.path());

    let (graph, id) = SchemaGraphLoader::default().load_graph(&main).unwrap();
    let used = ReachabilityAnalyzer::new(&graph).find_used(id);

    let expected = keys(&[
        (MSG, "IATA_TestRQ"),
        (CNS, "PayloadType"),
        (CNS, "BaseType"),
        (CNS, "Item"),
        (CNS, "AbstractItem"),
        (CNS, "ItemType"),
        (CNS, "CommonAttrs"),
        (CNS, "TokenListType"),
        (CNS, "TokenType"),
        (CNS, "CodeListType"),
        (CNS, "CodeA"),
        (CNS, "CodeB"),
    ]);
    assert_eq!(used, expected);
}

#[test]
fn unreachable_definitions_are_excluded() {
    let dir = TempDir::new().unwrap();
    let main = fixture(dir.path());

    let (graph, id) = SchemaGraphLoader::default().load_graph(&main).unwrap();
    let used = ReachabilityAnalyzer::new(&graph).find_used(id);

    assert!(graph.contains(&DefinitionKey::new(CNS, "UnusedType")));
    assert!(!used.contains(&DefinitionKey::new(CNS, "UnusedType")));
    assert!(!used.contains(&DefinitionKey::new(CNS, "UnusedGroup")));
}

#[test]
fn missing_and_foreign_references_are_reported() {
    let dir = TempDir::new().unwrap();
    let main = fixture(dir.path());

    let (graph, id) = SchemaGraphLoader::default().load_graph(&main).unwrap();
    let analysis = ReachabilityAnalyzer::new(&graph).analyze(id);

    assert_eq!(analysis.unresolved.len(), 1);
    assert_eq!(analysis.unresolved[0].value, "cns:Missing");
    assert_eq!(analysis.unresolved[0].from, DefinitionKey::new(MSG, "IATA_TestRQ"));
    assert_eq!(
        analysis.foreign_namespaces.into_iter().collect::<Vec<_>>(),
        vec![DS.to_string()]
    );
}

#[test]
fn analysis_is_repeatable() {
    let dir = TempDir::new().unwrap();
    let main = fixture(dir.path());

    let (graph, id) = SchemaGraphLoader::default().load_graph(&main).unwrap();
    let analyzer = ReachabilityAnalyzer::new(&graph);
    assert_eq!(analyzer.find_used(id), analyzer.find_used(id));
}
