use s3::types::{CloudBox, ErrorResp, ListCloudBoxResult};

#[test]
fn test_parse_list_cloud_box_result() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListCloudBoxResult>
  <Prefix>box</Prefix>
  <Marker></Marker>
  <MaxKeys>2</MaxKeys>
  <IsTruncated>true</IsTruncated>
  <NextMarker>cb-2</NextMarker>
  <Owner>
    <ID>51264</ID>
    <DisplayName>51264</DisplayName>
  </Owner>
  <CloudBoxes>
    <CloudBox>
      <ID>cb-1</ID>
      <Name>box-one</Name>
      <Owner>51264</Owner>
      <Region>cn-bj-1</Region>
      <ControlEndpoint>cb-1.control.test.com</ControlEndpoint>
      <DataEndpoint>cb-1.data.test.com</DataEndpoint>
    </CloudBox>
    <CloudBox>
      <ID>cb-2</ID>
      <Name>box-two</Name>
      <Owner>51264</Owner>
      <Region>cn-sh-1</Region>
      <ControlEndpoint>cb-2.control.test.com</ControlEndpoint>
      <DataEndpoint>cb-2.data.test.com</DataEndpoint>
    </CloudBox>
  </CloudBoxes>
</ListCloudBoxResult>"#;
    let result = ListCloudBoxResult::from_xml(body).unwrap();
    assert_eq!(result.prefix, "box");
    assert_eq!(result.marker, "");
    assert_eq!(result.max_keys, 2);
    assert!(result.is_truncated);
    assert_eq!(result.next_marker, "cb-2");
    assert_eq!(result.cloud_boxes.len(), 2);
    assert_eq!(
        result.cloud_boxes[1],
        CloudBox {
            id: "cb-2".to_string(),
            name: "box-two".to_string(),
            owner: "51264".to_string(),
            region: "cn-sh-1".to_string(),
            control_endpoint: "cb-2.control.test.com".to_string(),
            data_endpoint: "cb-2.data.test.com".to_string(),
        }
    );
}

#[test]
fn test_parse_last_page_without_boxes() {
    let body = "<ListCloudBoxResult><MaxKeys>100</MaxKeys><IsTruncated>false</IsTruncated></ListCloudBoxResult>";
    let result = ListCloudBoxResult::from_xml(body).unwrap();
    assert!(!result.is_truncated);
    assert!(result.next_marker.is_empty());
    assert!(result.cloud_boxes.is_empty());
}

#[test]
fn test_parse_invalid_list_body() {
    assert!(ListCloudBoxResult::from_xml("<ListCloudBoxResult><IsTruncated>maybe</IsTruncated></ListCloudBoxResult>").is_err());
}

#[test]
fn test_parse_error_resp() {
    let body = "<Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist.</Message><RequestId>5C3D</RequestId><HostId>h</HostId></Error>";
    let err = ErrorResp::from_xml(body).unwrap();
    assert_eq!(err.code, "NoSuchBucket");
    assert_eq!(err.request_id, "5C3D");
    assert!(ErrorResp::from_xml("").is_none());
}
